//! The entity-store seam between the web tier and the datastore.
//!
//! One method per collection operation. Creates enforce the relevant
//! uniqueness constraint and return [`Error::Conflict`] when violated;
//! lookups return [`Error::NotFound`] for absent ids. No transactions --
//! multi-step operations (the cascades) are sequenced by the caller.
//!
//! [`Error::Conflict`]: crate::error::Error::Conflict
//! [`Error::NotFound`]: crate::error::Error::NotFound

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Chapter, Exercise, Material, NewMaterial, NewUser, ParentRef, Subject, User,
};

#[async_trait]
pub trait EntityStore: Send + Sync {
    // --- subjects ---
    async fn create_subject(&self, name: &str) -> Result<Subject>;
    async fn subjects(&self) -> Result<Vec<Subject>>;
    async fn subject(&self, id: &str) -> Result<Subject>;
    async fn rename_subject(&self, id: &str, name: &str) -> Result<Subject>;
    async fn delete_subject(&self, id: &str) -> Result<()>;

    // --- chapters ---
    /// Uniqueness is (subject_id, name). Subject existence is the
    /// hierarchy service's job, not the store's.
    async fn create_chapter(&self, subject_id: &str, name: &str) -> Result<Chapter>;
    async fn chapters_by_subject(&self, subject_id: &str) -> Result<Vec<Chapter>>;
    async fn chapter(&self, id: &str) -> Result<Chapter>;
    async fn rename_chapter(&self, id: &str, name: &str) -> Result<Chapter>;
    async fn delete_chapter(&self, id: &str) -> Result<()>;

    // --- exercises ---
    async fn create_exercise(&self, chapter_id: &str, name: &str) -> Result<Exercise>;
    async fn exercises_by_chapter(&self, chapter_id: &str) -> Result<Vec<Exercise>>;
    async fn exercise(&self, id: &str) -> Result<Exercise>;
    async fn rename_exercise(&self, id: &str, name: &str) -> Result<Exercise>;
    async fn delete_exercise(&self, id: &str) -> Result<()>;

    // --- materials ---
    async fn create_material(&self, new: NewMaterial) -> Result<Material>;
    /// Materials attached directly to `parent`, newest first.
    async fn materials_by_parent(&self, parent: &ParentRef) -> Result<Vec<Material>>;
    async fn material(&self, id: &str) -> Result<Material>;
    async fn update_material(
        &self,
        id: &str,
        content: &str,
        storage_id: Option<String>,
    ) -> Result<Material>;
    async fn delete_material(&self, id: &str) -> Result<()>;

    // --- users ---
    async fn create_user(&self, new: NewUser) -> Result<User>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
}
