//! In-memory [`EntityStore`] used by tests and storage-less local runs.
//!
//! Tables are plain vectors behind one mutex; list order is insertion
//! order, which doubles as the creation-time order the Mongo store gets
//! from its indexes. UUIDs stand in for ObjectIds.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{
    Chapter, Exercise, Material, NewMaterial, NewUser, ParentRef, Subject, User,
};
use crate::store::EntityStore;

#[derive(Default)]
struct Tables {
    subjects: Vec<Subject>,
    chapters: Vec<Chapter>,
    exercises: Vec<Exercise>,
    materials: Vec<Material>,
    users: Vec<User>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_subject(&self, name: &str) -> Result<Subject> {
        let mut t = self.inner.lock().unwrap();
        if t.subjects.iter().any(|s| s.name == name) {
            return Err(Error::Conflict("Subject already exists".into()));
        }
        let now = Utc::now();
        let subject = Subject {
            id: new_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.subjects.push(subject.clone());
        Ok(subject)
    }

    async fn subjects(&self) -> Result<Vec<Subject>> {
        Ok(self.inner.lock().unwrap().subjects.clone())
    }

    async fn subject(&self, id: &str) -> Result<Subject> {
        self.inner
            .lock()
            .unwrap()
            .subjects
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("Subject"))
    }

    async fn rename_subject(&self, id: &str, name: &str) -> Result<Subject> {
        let mut t = self.inner.lock().unwrap();
        let subject = t
            .subjects
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found("Subject"))?;
        subject.name = name.to_string();
        subject.updated_at = Utc::now();
        Ok(subject.clone())
    }

    async fn delete_subject(&self, id: &str) -> Result<()> {
        let mut t = self.inner.lock().unwrap();
        let before = t.subjects.len();
        t.subjects.retain(|s| s.id != id);
        if t.subjects.len() == before {
            return Err(Error::not_found("Subject"));
        }
        Ok(())
    }

    async fn create_chapter(&self, subject_id: &str, name: &str) -> Result<Chapter> {
        let mut t = self.inner.lock().unwrap();
        if t.chapters
            .iter()
            .any(|c| c.subject_id == subject_id && c.chapter_name == name)
        {
            return Err(Error::Conflict(
                "Chapter already exists for this subject".into(),
            ));
        }
        let now = Utc::now();
        let chapter = Chapter {
            id: new_id(),
            subject_id: subject_id.to_string(),
            chapter_name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.chapters.push(chapter.clone());
        Ok(chapter)
    }

    async fn chapters_by_subject(&self, subject_id: &str) -> Result<Vec<Chapter>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .chapters
            .iter()
            .filter(|c| c.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn chapter(&self, id: &str) -> Result<Chapter> {
        self.inner
            .lock()
            .unwrap()
            .chapters
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("Chapter"))
    }

    async fn rename_chapter(&self, id: &str, name: &str) -> Result<Chapter> {
        let mut t = self.inner.lock().unwrap();
        let chapter = t
            .chapters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::not_found("Chapter"))?;
        chapter.chapter_name = name.to_string();
        chapter.updated_at = Utc::now();
        Ok(chapter.clone())
    }

    async fn delete_chapter(&self, id: &str) -> Result<()> {
        let mut t = self.inner.lock().unwrap();
        let before = t.chapters.len();
        t.chapters.retain(|c| c.id != id);
        if t.chapters.len() == before {
            return Err(Error::not_found("Chapter"));
        }
        Ok(())
    }

    async fn create_exercise(&self, chapter_id: &str, name: &str) -> Result<Exercise> {
        let mut t = self.inner.lock().unwrap();
        if t.exercises
            .iter()
            .any(|e| e.chapter_id == chapter_id && e.exercise_name == name)
        {
            return Err(Error::Conflict(
                "Exercise already exists for this chapter".into(),
            ));
        }
        let now = Utc::now();
        let exercise = Exercise {
            id: new_id(),
            chapter_id: chapter_id.to_string(),
            exercise_name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.exercises.push(exercise.clone());
        Ok(exercise)
    }

    async fn exercises_by_chapter(&self, chapter_id: &str) -> Result<Vec<Exercise>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .exercises
            .iter()
            .filter(|e| e.chapter_id == chapter_id)
            .cloned()
            .collect())
    }

    async fn exercise(&self, id: &str) -> Result<Exercise> {
        self.inner
            .lock()
            .unwrap()
            .exercises
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("Exercise"))
    }

    async fn rename_exercise(&self, id: &str, name: &str) -> Result<Exercise> {
        let mut t = self.inner.lock().unwrap();
        let exercise = t
            .exercises
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::not_found("Exercise"))?;
        exercise.exercise_name = name.to_string();
        exercise.updated_at = Utc::now();
        Ok(exercise.clone())
    }

    async fn delete_exercise(&self, id: &str) -> Result<()> {
        let mut t = self.inner.lock().unwrap();
        let before = t.exercises.len();
        t.exercises.retain(|e| e.id != id);
        if t.exercises.len() == before {
            return Err(Error::not_found("Exercise"));
        }
        Ok(())
    }

    async fn create_material(&self, new: NewMaterial) -> Result<Material> {
        let mut t = self.inner.lock().unwrap();
        let now = Utc::now();
        let material = Material {
            id: new_id(),
            parent: new.parent,
            kind: new.kind,
            content: new.content,
            storage_id: new.storage_id,
            created_at: now,
            updated_at: now,
        };
        t.materials.push(material.clone());
        Ok(material)
    }

    async fn materials_by_parent(&self, parent: &ParentRef) -> Result<Vec<Material>> {
        // Newest first, matching the Mongo store's createdAt sort.
        Ok(self
            .inner
            .lock()
            .unwrap()
            .materials
            .iter()
            .rev()
            .filter(|m| m.parent == *parent)
            .cloned()
            .collect())
    }

    async fn material(&self, id: &str) -> Result<Material> {
        self.inner
            .lock()
            .unwrap()
            .materials
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("Material"))
    }

    async fn update_material(
        &self,
        id: &str,
        content: &str,
        storage_id: Option<String>,
    ) -> Result<Material> {
        let mut t = self.inner.lock().unwrap();
        let material = t
            .materials
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::not_found("Material"))?;
        material.content = content.to_string();
        material.storage_id = storage_id;
        material.updated_at = Utc::now();
        Ok(material.clone())
    }

    async fn delete_material(&self, id: &str) -> Result<()> {
        let mut t = self.inner.lock().unwrap();
        let before = t.materials.len();
        t.materials.retain(|m| m.id != id);
        if t.materials.len() == before {
            return Err(Error::not_found("Material"));
        }
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut t = self.inner.lock().unwrap();
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(Error::Conflict("User already exists".into()));
        }
        let user = User {
            id: new_id(),
            name: new.name,
            email: new.email,
            role: new.role,
            password_digest: new.password_digest,
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaterialKind;

    #[tokio::test]
    async fn subject_create_conflicts_on_duplicate_name() {
        let store = MemoryStore::new();
        store.create_subject("Math").await.unwrap();
        let err = store.create_subject("Math").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.subjects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_chapter_name_allowed_under_different_subjects() {
        let store = MemoryStore::new();
        let math = store.create_subject("Math").await.unwrap();
        let physics = store.create_subject("Physics").await.unwrap();
        store.create_chapter(&math.id, "Intro").await.unwrap();
        store.create_chapter(&physics.id, "Intro").await.unwrap();
        let err = store.create_chapter(&math.id, "Intro").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_is_not_idempotent() {
        let store = MemoryStore::new();
        let subject = store.create_subject("Math").await.unwrap();
        store.delete_subject(&subject.id).await.unwrap();
        let err = store.delete_subject(&subject.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn materials_list_newest_first() {
        let store = MemoryStore::new();
        let parent = ParentRef::Subject("s1".into());
        for content in ["first", "second"] {
            store
                .create_material(NewMaterial {
                    parent: parent.clone(),
                    kind: MaterialKind::Text,
                    content: content.into(),
                    storage_id: None,
                })
                .await
                .unwrap();
        }
        let materials = store.materials_by_parent(&parent).await.unwrap();
        assert_eq!(materials[0].content, "second");
        assert_eq!(materials[1].content, "first");
    }

    #[tokio::test]
    async fn text_material_round_trips_content() {
        let store = MemoryStore::new();
        let created = store
            .create_material(NewMaterial {
                parent: ParentRef::Exercise("e1".into()),
                kind: MaterialKind::Text,
                content: "X".into(),
                storage_id: None,
            })
            .await
            .unwrap();
        let fetched = store.material(&created.id).await.unwrap();
        assert_eq!(fetched.content, "X");
    }
}
