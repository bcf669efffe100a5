//! Shared application state.

use std::sync::Arc;

use studyshelf_core::EntityStore;
use studyshelf_storage::ObjectStore;

use crate::auth::TokenAuth;
use crate::hierarchy::Hierarchy;

pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub hierarchy: Hierarchy,
    pub auth: TokenAuth,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EntityStore>,
        objects: Arc<dyn ObjectStore>,
        auth: TokenAuth,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            hierarchy: Hierarchy::new(store.clone(), objects.clone()),
            store,
            objects,
            auth,
            max_upload_bytes,
        }
    }
}
