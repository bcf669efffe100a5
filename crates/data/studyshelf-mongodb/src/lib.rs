//! studyshelf-mongodb -- the MongoDB [`EntityStore`].
//!
//! Query shapes mirror the deployed collections: find-then-insert conflict
//! checks, parent-id filters, and a `createdAt: -1` sort on material
//! lists. Unique indexes are ensured at connect time as a backstop behind
//! the conflict checks; a duplicate-key write that slips past a check
//! still surfaces as a Conflict, never a 500.

mod doc;

use async_trait::async_trait;
use bson::doc;
use bson::DateTime;
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use studyshelf_core::{
    Chapter, EntityStore, Error, Exercise, Material, NewMaterial, NewUser, ParentRef, Result,
    Subject, User,
};

use doc::{parse_oid, ChapterDoc, ExerciseDoc, MaterialDoc, SubjectDoc, UserDoc};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connects and ensures the unique indexes.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await.map_err(db_err)?;
        let store = Self {
            db: client.database(db_name),
        };
        store.ensure_indexes().await?;
        tracing::info!(db = db_name, "mongodb connected");
        Ok(store)
    }

    fn subjects_coll(&self) -> Collection<SubjectDoc> {
        self.db.collection("subjects")
    }

    fn chapters_coll(&self) -> Collection<ChapterDoc> {
        self.db.collection("chapters")
    }

    fn exercises_coll(&self) -> Collection<ExerciseDoc> {
        self.db.collection("exercises")
    }

    fn materials_coll(&self) -> Collection<MaterialDoc> {
        self.db.collection("materials")
    }

    fn users_coll(&self) -> Collection<UserDoc> {
        self.db.collection("users")
    }

    async fn ensure_indexes(&self) -> Result<()> {
        self.subjects_coll()
            .create_index(unique_index(doc! { "name": 1 }))
            .await
            .map_err(db_err)?;
        self.chapters_coll()
            .create_index(unique_index(doc! { "subjectId": 1, "chapterName": 1 }))
            .await
            .map_err(db_err)?;
        self.exercises_coll()
            .create_index(unique_index(doc! { "chapterId": 1, "exerciseName": 1 }))
            .await
            .map_err(db_err)?;
        self.users_coll()
            .create_index(unique_index(doc! { "email": 1 }))
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

fn unique_index(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn db_err(e: mongodb::error::Error) -> Error {
    Error::Database(e.to_string())
}

/// Duplicate-key writes become Conflicts with the caller's message.
fn write_err(e: mongodb::error::Error, conflict_msg: &str) -> Error {
    if let ErrorKind::Write(WriteFailure::WriteError(ref we)) = *e.kind {
        if we.code == DUPLICATE_KEY {
            return Error::Conflict(conflict_msg.to_string());
        }
    }
    db_err(e)
}

fn parent_filter(parent: &ParentRef) -> Result<bson::Document> {
    Ok(match parent {
        ParentRef::Subject(id) => doc! { "subjectId": parse_oid(id, "Subject")? },
        ParentRef::Chapter(id) => doc! { "chapterId": parse_oid(id, "Chapter")? },
        ParentRef::Exercise(id) => doc! { "exerciseId": parse_oid(id, "Exercise")? },
    })
}

#[async_trait]
impl EntityStore for MongoStore {
    async fn create_subject(&self, name: &str) -> Result<Subject> {
        let coll = self.subjects_coll();
        if coll
            .find_one(doc! { "name": name })
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(Error::Conflict("Subject already exists".into()));
        }
        let subject = SubjectDoc::new(name);
        coll.insert_one(&subject)
            .await
            .map_err(|e| write_err(e, "Subject already exists"))?;
        Ok(subject.into())
    }

    async fn subjects(&self) -> Result<Vec<Subject>> {
        let docs: Vec<SubjectDoc> = self
            .subjects_coll()
            .find(doc! {})
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(Subject::from).collect())
    }

    async fn subject(&self, id: &str) -> Result<Subject> {
        let oid = parse_oid(id, "Subject")?;
        self.subjects_coll()
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?
            .map(Subject::from)
            .ok_or_else(|| Error::not_found("Subject"))
    }

    async fn rename_subject(&self, id: &str, name: &str) -> Result<Subject> {
        let oid = parse_oid(id, "Subject")?;
        let updated = self
            .subjects_coll()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "name": name, "updatedAt": DateTime::now() } },
            )
            .await
            .map_err(db_err)?;
        if updated.matched_count == 0 {
            return Err(Error::not_found("Subject"));
        }
        self.subject(id).await
    }

    async fn delete_subject(&self, id: &str) -> Result<()> {
        let oid = parse_oid(id, "Subject")?;
        let deleted = self
            .subjects_coll()
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        if deleted.deleted_count == 0 {
            return Err(Error::not_found("Subject"));
        }
        Ok(())
    }

    async fn create_chapter(&self, subject_id: &str, name: &str) -> Result<Chapter> {
        let subject_oid = parse_oid(subject_id, "Subject")?;
        let coll = self.chapters_coll();
        if coll
            .find_one(doc! { "subjectId": subject_oid, "chapterName": name })
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(Error::Conflict(
                "Chapter already exists for this subject".into(),
            ));
        }
        let chapter = ChapterDoc::new(subject_oid, name);
        coll.insert_one(&chapter)
            .await
            .map_err(|e| write_err(e, "Chapter already exists for this subject"))?;
        Ok(chapter.into())
    }

    async fn chapters_by_subject(&self, subject_id: &str) -> Result<Vec<Chapter>> {
        let oid = parse_oid(subject_id, "Subject")?;
        let docs: Vec<ChapterDoc> = self
            .chapters_coll()
            .find(doc! { "subjectId": oid })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(Chapter::from).collect())
    }

    async fn chapter(&self, id: &str) -> Result<Chapter> {
        let oid = parse_oid(id, "Chapter")?;
        self.chapters_coll()
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?
            .map(Chapter::from)
            .ok_or_else(|| Error::not_found("Chapter"))
    }

    async fn rename_chapter(&self, id: &str, name: &str) -> Result<Chapter> {
        let oid = parse_oid(id, "Chapter")?;
        let updated = self
            .chapters_coll()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "chapterName": name, "updatedAt": DateTime::now() } },
            )
            .await
            .map_err(db_err)?;
        if updated.matched_count == 0 {
            return Err(Error::not_found("Chapter"));
        }
        self.chapter(id).await
    }

    async fn delete_chapter(&self, id: &str) -> Result<()> {
        let oid = parse_oid(id, "Chapter")?;
        let deleted = self
            .chapters_coll()
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        if deleted.deleted_count == 0 {
            return Err(Error::not_found("Chapter"));
        }
        Ok(())
    }

    async fn create_exercise(&self, chapter_id: &str, name: &str) -> Result<Exercise> {
        let chapter_oid = parse_oid(chapter_id, "Chapter")?;
        let coll = self.exercises_coll();
        if coll
            .find_one(doc! { "chapterId": chapter_oid, "exerciseName": name })
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(Error::Conflict(
                "Exercise already exists for this chapter".into(),
            ));
        }
        let exercise = ExerciseDoc::new(chapter_oid, name);
        coll.insert_one(&exercise)
            .await
            .map_err(|e| write_err(e, "Exercise already exists for this chapter"))?;
        Ok(exercise.into())
    }

    async fn exercises_by_chapter(&self, chapter_id: &str) -> Result<Vec<Exercise>> {
        let oid = parse_oid(chapter_id, "Chapter")?;
        let docs: Vec<ExerciseDoc> = self
            .exercises_coll()
            .find(doc! { "chapterId": oid })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(Exercise::from).collect())
    }

    async fn exercise(&self, id: &str) -> Result<Exercise> {
        let oid = parse_oid(id, "Exercise")?;
        self.exercises_coll()
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?
            .map(Exercise::from)
            .ok_or_else(|| Error::not_found("Exercise"))
    }

    async fn rename_exercise(&self, id: &str, name: &str) -> Result<Exercise> {
        let oid = parse_oid(id, "Exercise")?;
        let updated = self
            .exercises_coll()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "exerciseName": name, "updatedAt": DateTime::now() } },
            )
            .await
            .map_err(db_err)?;
        if updated.matched_count == 0 {
            return Err(Error::not_found("Exercise"));
        }
        self.exercise(id).await
    }

    async fn delete_exercise(&self, id: &str) -> Result<()> {
        let oid = parse_oid(id, "Exercise")?;
        let deleted = self
            .exercises_coll()
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        if deleted.deleted_count == 0 {
            return Err(Error::not_found("Exercise"));
        }
        Ok(())
    }

    async fn create_material(&self, new: NewMaterial) -> Result<Material> {
        let level = match new.parent {
            ParentRef::Subject(_) => "Subject",
            ParentRef::Chapter(_) => "Chapter",
            ParentRef::Exercise(_) => "Exercise",
        };
        let parent_oid = parse_oid(new.parent.id(), level)?;
        let material = MaterialDoc::new(&new, parent_oid);
        self.materials_coll()
            .insert_one(&material)
            .await
            .map_err(db_err)?;
        material.into_material()
    }

    async fn materials_by_parent(&self, parent: &ParentRef) -> Result<Vec<Material>> {
        let docs: Vec<MaterialDoc> = self
            .materials_coll()
            .find(parent_filter(parent)?)
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        docs.into_iter().map(MaterialDoc::into_material).collect()
    }

    async fn material(&self, id: &str) -> Result<Material> {
        let oid = parse_oid(id, "Material")?;
        self.materials_coll()
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?
            .ok_or_else(|| Error::not_found("Material"))?
            .into_material()
    }

    async fn update_material(
        &self,
        id: &str,
        content: &str,
        storage_id: Option<String>,
    ) -> Result<Material> {
        let oid = parse_oid(id, "Material")?;
        let updated = self
            .materials_coll()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "content": content,
                    "storageId": storage_id,
                    "updatedAt": DateTime::now(),
                } },
            )
            .await
            .map_err(db_err)?;
        if updated.matched_count == 0 {
            return Err(Error::not_found("Material"));
        }
        self.material(id).await
    }

    async fn delete_material(&self, id: &str) -> Result<()> {
        let oid = parse_oid(id, "Material")?;
        let deleted = self
            .materials_coll()
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        if deleted.deleted_count == 0 {
            return Err(Error::not_found("Material"));
        }
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let coll = self.users_coll();
        if coll
            .find_one(doc! { "email": &new.email })
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(Error::Conflict("User already exists".into()));
        }
        let user = UserDoc::new(&new);
        coll.insert_one(&user)
            .await
            .map_err(|e| write_err(e, "User already exists"))?;
        Ok(user.into())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users_coll()
            .find_one(doc! { "email": email })
            .await
            .map_err(db_err)?
            .map(User::from))
    }
}
