//! studyshelf-storage -- object storage for uploaded materials.
//!
//! Two backends behind one trait: [`CloudStore`] talks to a
//! Cloudinary-style HTTP API with sha1-signed requests, [`LocalStore`] is
//! the legacy disk backend whose files the web tier serves statically.
//! Callers own the store-new-then-delete-old ordering on replacement.

mod cloud;
mod local;

use async_trait::async_trait;
use serde::Serialize;

use studyshelf_core::Result;

pub use cloud::CloudStore;
pub use local::LocalStore;

/// Provider-side resource class. Images get image processing endpoints,
/// everything else is an opaque blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Image,
    Raw,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Image => "image",
            StorageKind::Raw => "raw",
        }
    }
}

/// What a successful upload hands back; `storage_id` is what `remove`
/// later needs.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub url: String,
    pub storage_id: String,
    pub kind: StorageKind,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `bytes` under `folder` with the given (already
    /// collision-resistant) file name.
    async fn store(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        file_name: &str,
        kind: StorageKind,
    ) -> Result<StoredObject>;

    /// Removes a previously stored object. Removing an object that is
    /// already gone is a success.
    async fn remove(&self, storage_id: &str, kind: StorageKind) -> Result<()>;
}
