//! Referential integrity across Subject → Chapter → Exercise → Material.
//!
//! Creates validate the parent; deletes fan out to every transitively
//! owned record, children before parent. There is no atomicity across the
//! steps -- each record delete is individually idempotent (a child already
//! gone is skipped), so an interrupted cascade can be re-run. Stored
//! binaries are removed best-effort: a storage failure is logged and the
//! record deleted anyway.

use std::sync::Arc;

use studyshelf_core::{
    Chapter, EntityStore, Error, Exercise, Material, ParentRef, Result, Subject,
};
use studyshelf_storage::ObjectStore;

use crate::ingest::storage_kind;

pub struct Hierarchy {
    store: Arc<dyn EntityStore>,
    objects: Arc<dyn ObjectStore>,
}

impl Hierarchy {
    pub fn new(store: Arc<dyn EntityStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    /// Subject must exist; name uniqueness is the store's check.
    pub async fn add_chapter(&self, subject_id: &str, name: &str) -> Result<(Chapter, Subject)> {
        let subject = self.store.subject(subject_id).await?;
        let chapter = self.store.create_chapter(subject_id, name).await?;
        Ok((chapter, subject))
    }

    pub async fn add_exercise(&self, chapter_id: &str, name: &str) -> Result<(Exercise, Chapter)> {
        let chapter = self.store.chapter(chapter_id).await?;
        let exercise = self.store.create_exercise(chapter_id, name).await?;
        Ok((exercise, chapter))
    }

    /// Parent-existence check for material creation.
    pub async fn ensure_parent(&self, parent: &ParentRef) -> Result<()> {
        match parent {
            ParentRef::Subject(id) => self.store.subject(id).await.map(|_| ()),
            ParentRef::Chapter(id) => self.store.chapter(id).await.map(|_| ()),
            ParentRef::Exercise(id) => self.store.exercise(id).await.map(|_| ()),
        }
    }

    pub async fn delete_subject(&self, id: &str) -> Result<Subject> {
        let subject = self.store.subject(id).await?;

        let chapters = self.store.chapters_by_subject(id).await?;
        let mut exercises = Vec::new();
        for chapter in &chapters {
            exercises.extend(self.store.exercises_by_chapter(&chapter.id).await?);
        }

        // Materials at all three levels.
        let mut materials = self
            .store
            .materials_by_parent(&ParentRef::Subject(id.to_string()))
            .await?;
        for chapter in &chapters {
            materials.extend(
                self.store
                    .materials_by_parent(&ParentRef::Chapter(chapter.id.clone()))
                    .await?,
            );
        }
        for exercise in &exercises {
            materials.extend(
                self.store
                    .materials_by_parent(&ParentRef::Exercise(exercise.id.clone()))
                    .await?,
            );
        }

        self.remove_records(materials, exercises, chapters).await?;
        self.store.delete_subject(id).await?;
        Ok(subject)
    }

    pub async fn delete_chapter(&self, id: &str) -> Result<Chapter> {
        let chapter = self.store.chapter(id).await?;

        let exercises = self.store.exercises_by_chapter(id).await?;
        let mut materials = self
            .store
            .materials_by_parent(&ParentRef::Chapter(id.to_string()))
            .await?;
        for exercise in &exercises {
            materials.extend(
                self.store
                    .materials_by_parent(&ParentRef::Exercise(exercise.id.clone()))
                    .await?,
            );
        }

        self.remove_records(materials, exercises, Vec::new()).await?;
        self.store.delete_chapter(id).await?;
        Ok(chapter)
    }

    pub async fn delete_exercise(&self, id: &str) -> Result<Exercise> {
        let exercise = self.store.exercise(id).await?;
        let materials = self
            .store
            .materials_by_parent(&ParentRef::Exercise(id.to_string()))
            .await?;

        self.remove_records(materials, Vec::new(), Vec::new()).await?;
        self.store.delete_exercise(id).await?;
        Ok(exercise)
    }

    pub async fn delete_material(&self, id: &str) -> Result<Material> {
        let material = self.store.material(id).await?;
        self.discard_stored(&material).await;
        self.store.delete_material(id).await?;
        Ok(material)
    }

    /// Children before parents; record deletes tolerate already-missing
    /// rows so a half-finished cascade can be re-run.
    async fn remove_records(
        &self,
        materials: Vec<Material>,
        exercises: Vec<Exercise>,
        chapters: Vec<Chapter>,
    ) -> Result<()> {
        for material in &materials {
            self.discard_stored(material).await;
        }
        for material in &materials {
            absorb_missing(self.store.delete_material(&material.id).await)?;
        }
        for exercise in &exercises {
            absorb_missing(self.store.delete_exercise(&exercise.id).await)?;
        }
        for chapter in &chapters {
            absorb_missing(self.store.delete_chapter(&chapter.id).await)?;
        }
        Ok(())
    }

    /// Best-effort removal of the stored binary.
    async fn discard_stored(&self, material: &Material) {
        if material.kind.is_text() {
            return;
        }
        let Some(storage_id) = &material.storage_id else {
            return;
        };
        if let Err(err) = self
            .objects
            .remove(storage_id, storage_kind(material.kind))
            .await
        {
            tracing::warn!(material = %material.id, %err, "failed to remove stored object");
        }
    }
}

fn absorb_missing(result: Result<()>) -> Result<()> {
    match result {
        Err(Error::NotFound(_)) => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use studyshelf_core::{MaterialKind, MemoryStore, NewMaterial};
    use studyshelf_storage::{StorageKind, StoredObject};

    /// Records removals; optionally fails them all.
    #[derive(Default)]
    struct RecordingObjects {
        removed: Mutex<Vec<String>>,
        fail_removals: bool,
    }

    #[async_trait]
    impl ObjectStore for RecordingObjects {
        async fn store(
            &self,
            _bytes: Vec<u8>,
            folder: &str,
            file_name: &str,
            kind: StorageKind,
        ) -> Result<StoredObject> {
            Ok(StoredObject {
                url: format!("https://objects.test/{folder}/{file_name}"),
                storage_id: format!("{folder}/{file_name}"),
                kind,
            })
        }

        async fn remove(&self, storage_id: &str, _kind: StorageKind) -> Result<()> {
            self.removed.lock().unwrap().push(storage_id.to_string());
            if self.fail_removals {
                return Err(Error::Storage("provider is down".into()));
            }
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        objects: Arc<RecordingObjects>,
        hierarchy: Hierarchy,
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingObjects::default())
    }

    fn fixture_with(objects: RecordingObjects) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let objects = Arc::new(objects);
        Fixture {
            hierarchy: Hierarchy::new(store.clone(), objects.clone()),
            store,
            objects,
        }
    }

    async fn text_material(store: &MemoryStore, parent: ParentRef, content: &str) -> Material {
        store
            .create_material(NewMaterial {
                parent,
                kind: MaterialKind::Text,
                content: content.into(),
                storage_id: None,
            })
            .await
            .unwrap()
    }

    async fn image_material(store: &MemoryStore, parent: ParentRef, storage_id: &str) -> Material {
        store
            .create_material(NewMaterial {
                parent,
                kind: MaterialKind::Image,
                content: format!("https://objects.test/{storage_id}"),
                storage_id: Some(storage_id.into()),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_chapter_requires_existing_subject() {
        let f = fixture();
        let err = f.hierarchy.add_chapter("missing", "Algebra").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(f
            .store
            .chapters_by_subject("missing")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_chapter_name_yields_one_conflict() {
        let f = fixture();
        let subject = f.store.create_subject("Math").await.unwrap();
        f.hierarchy.add_chapter(&subject.id, "Algebra").await.unwrap();
        let err = f
            .hierarchy
            .add_chapter(&subject.id, "Algebra")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(
            f.store.chapters_by_subject(&subject.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn delete_subject_cascades_through_all_levels() {
        let f = fixture();
        let subject = f.store.create_subject("Math").await.unwrap();
        let (chapter, _) = f.hierarchy.add_chapter(&subject.id, "Algebra").await.unwrap();
        let (exercise, _) = f
            .hierarchy
            .add_exercise(&chapter.id, "Linear Equations")
            .await
            .unwrap();

        text_material(&f.store, ParentRef::Subject(subject.id.clone()), "syllabus").await;
        image_material(&f.store, ParentRef::Chapter(chapter.id.clone()), "materials/ch.png").await;
        text_material(
            &f.store,
            ParentRef::Exercise(exercise.id.clone()),
            "Solve 2x=4",
        )
        .await;

        f.hierarchy.delete_subject(&subject.id).await.unwrap();

        assert!(f.store.subjects().await.unwrap().is_empty());
        assert!(f
            .store
            .chapters_by_subject(&subject.id)
            .await
            .unwrap()
            .is_empty());
        assert!(f
            .store
            .exercises_by_chapter(&chapter.id)
            .await
            .unwrap()
            .is_empty());
        for parent in [
            ParentRef::Subject(subject.id.clone()),
            ParentRef::Chapter(chapter.id.clone()),
            ParentRef::Exercise(exercise.id.clone()),
        ] {
            assert!(f.store.materials_by_parent(&parent).await.unwrap().is_empty());
        }
        // Only the chapter image had a stored object.
        assert_eq!(
            *f.objects.removed.lock().unwrap(),
            vec!["materials/ch.png".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_subject_with_no_children_succeeds() {
        let f = fixture();
        let subject = f.store.create_subject("Empty").await.unwrap();
        f.hierarchy.delete_subject(&subject.id).await.unwrap();
        assert!(f.store.subjects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_delete_reports_not_found() {
        let f = fixture();
        let subject = f.store.create_subject("Math").await.unwrap();
        f.hierarchy.delete_subject(&subject.id).await.unwrap();
        let err = f.hierarchy.delete_subject(&subject.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_chapter_leaves_siblings_alone() {
        let f = fixture();
        let subject = f.store.create_subject("Math").await.unwrap();
        let (algebra, _) = f.hierarchy.add_chapter(&subject.id, "Algebra").await.unwrap();
        let (geometry, _) = f.hierarchy.add_chapter(&subject.id, "Geometry").await.unwrap();
        let (exercise, _) = f
            .hierarchy
            .add_exercise(&algebra.id, "Linear Equations")
            .await
            .unwrap();
        text_material(&f.store, ParentRef::Exercise(exercise.id.clone()), "x").await;

        f.hierarchy.delete_chapter(&algebra.id).await.unwrap();

        let remaining = f.store.chapters_by_subject(&subject.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, geometry.id);
        assert!(f
            .store
            .materials_by_parent(&ParentRef::Exercise(exercise.id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_image_material_removes_exactly_one_object() {
        let f = fixture();
        let subject = f.store.create_subject("Math").await.unwrap();
        let material = image_material(
            &f.store,
            ParentRef::Subject(subject.id.clone()),
            "materials/pic.png",
        )
        .await;

        f.hierarchy.delete_material(&material.id).await.unwrap();

        assert_eq!(
            *f.objects.removed.lock().unwrap(),
            vec!["materials/pic.png".to_string()]
        );
        assert!(matches!(
            f.store.material(&material.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn storage_failure_does_not_block_record_deletion() {
        let f = fixture_with(RecordingObjects {
            fail_removals: true,
            ..Default::default()
        });
        let subject = f.store.create_subject("Math").await.unwrap();
        let material = image_material(
            &f.store,
            ParentRef::Subject(subject.id.clone()),
            "materials/stuck.png",
        )
        .await;

        f.hierarchy.delete_material(&material.id).await.unwrap();
        assert!(matches!(
            f.store.material(&material.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn renaming_chapter_keeps_parent_and_children() {
        let f = fixture();
        let subject = f.store.create_subject("Math").await.unwrap();
        let (chapter, _) = f.hierarchy.add_chapter(&subject.id, "Algebra").await.unwrap();
        let (exercise, _) = f
            .hierarchy
            .add_exercise(&chapter.id, "Linear Equations")
            .await
            .unwrap();

        let renamed = f
            .store
            .rename_chapter(&chapter.id, "Algebra II")
            .await
            .unwrap();

        assert_eq!(renamed.subject_id, subject.id);
        let exercises = f.store.exercises_by_chapter(&chapter.id).await.unwrap();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].id, exercise.id);
    }
}
