//! BSON document shapes and their mapping to the domain entities.
//!
//! Documents keep the collection layout the original deployment already
//! has: camelCase fields, `_id` ObjectIds, `createdAt`/`updatedAt`
//! datetimes, and the three nullable parent-id columns on materials. The
//! tagged [`ParentRef`] exists only on the domain side.

use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

use studyshelf_core::{
    Chapter, Error, Exercise, Material, MaterialKind, NewMaterial, NewUser, ParentRef, Result,
    Role, Subject, User,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubjectDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl SubjectDoc {
    pub fn new(name: &str) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<SubjectDoc> for Subject {
    fn from(doc: SubjectDoc) -> Self {
        Subject {
            id: doc.id.to_hex(),
            name: doc.name,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChapterDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub subject_id: ObjectId,
    pub chapter_name: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl ChapterDoc {
    pub fn new(subject_id: ObjectId, name: &str) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            subject_id,
            chapter_name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<ChapterDoc> for Chapter {
    fn from(doc: ChapterDoc) -> Self {
        Chapter {
            id: doc.id.to_hex(),
            subject_id: doc.subject_id.to_hex(),
            chapter_name: doc.chapter_name,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExerciseDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub chapter_id: ObjectId,
    pub exercise_name: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl ExerciseDoc {
    pub fn new(chapter_id: ObjectId, name: &str) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            chapter_id,
            exercise_name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<ExerciseDoc> for Exercise {
    fn from(doc: ExerciseDoc) -> Self {
        Exercise {
            id: doc.id.to_hex(),
            chapter_id: doc.chapter_id.to_hex(),
            exercise_name: doc.exercise_name,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MaterialDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub material_type: String,
    pub subject_id: Option<ObjectId>,
    pub chapter_id: Option<ObjectId>,
    pub exercise_id: Option<ObjectId>,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub content: String,
    pub storage_id: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl MaterialDoc {
    pub fn new(new: &NewMaterial, parent_oid: ObjectId) -> Self {
        let now = DateTime::now();
        let (subject_id, chapter_id, exercise_id) = match new.parent {
            ParentRef::Subject(_) => (Some(parent_oid), None, None),
            ParentRef::Chapter(_) => (None, Some(parent_oid), None),
            ParentRef::Exercise(_) => (None, None, Some(parent_oid)),
        };
        Self {
            id: ObjectId::new(),
            material_type: new.parent.level().to_string(),
            subject_id,
            chapter_id,
            exercise_id,
            kind: new.kind,
            content: new.content.clone(),
            storage_id: new.storage_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_material(self) -> Result<Material> {
        let parent = ParentRef::from_ids(
            self.subject_id.map(|o| o.to_hex()),
            self.chapter_id.map(|o| o.to_hex()),
            self.exercise_id.map(|o| o.to_hex()),
        )
        .map_err(|_| {
            Error::Database(format!("material {} has an inconsistent parent", self.id))
        })?;
        Ok(Material {
            id: self.id.to_hex(),
            parent,
            kind: self.kind,
            content: self.content,
            storage_id: self.storage_id,
            created_at: self.created_at.to_chrono(),
            updated_at: self.updated_at.to_chrono(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_digest: String,
    pub created_at: DateTime,
}

impl UserDoc {
    pub fn new(new: &NewUser) -> Self {
        Self {
            id: ObjectId::new(),
            name: new.name.clone(),
            email: new.email.clone(),
            role: new.role,
            password_digest: new.password_digest.clone(),
            created_at: DateTime::now(),
        }
    }
}

impl From<UserDoc> for User {
    fn from(doc: UserDoc) -> Self {
        User {
            id: doc.id.to_hex(),
            name: doc.name,
            email: doc.email,
            role: doc.role,
            password_digest: doc.password_digest,
            created_at: doc.created_at.to_chrono(),
        }
    }
}

/// Invalid hex is indistinguishable from an absent record to callers.
pub(crate) fn parse_oid(id: &str, what: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| Error::not_found(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_doc_maps_to_hex_id() {
        let doc = SubjectDoc::new("Math");
        let hex = doc.id.to_hex();
        let subject: Subject = doc.into();
        assert_eq!(subject.id, hex);
        assert_eq!(subject.name, "Math");
    }

    #[test]
    fn material_doc_rebuilds_tagged_parent() {
        let chapter = ObjectId::new();
        let new = NewMaterial {
            parent: ParentRef::Chapter(chapter.to_hex()),
            kind: MaterialKind::Text,
            content: "notes".into(),
            storage_id: None,
        };
        let material = MaterialDoc::new(&new, chapter).into_material().unwrap();
        assert_eq!(material.parent, ParentRef::Chapter(chapter.to_hex()));
        assert_eq!(material.content, "notes");
    }

    #[test]
    fn material_doc_with_two_parents_is_corrupt() {
        let doc = MaterialDoc {
            id: ObjectId::new(),
            material_type: "chapter".into(),
            subject_id: Some(ObjectId::new()),
            chapter_id: Some(ObjectId::new()),
            exercise_id: None,
            kind: MaterialKind::Text,
            content: String::new(),
            storage_id: None,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        assert!(matches!(doc.into_material(), Err(Error::Database(_))));
    }

    #[test]
    fn parse_oid_treats_bad_hex_as_missing() {
        assert!(matches!(
            parse_oid("not-hex", "Subject"),
            Err(Error::NotFound(_))
        ));
    }
}
