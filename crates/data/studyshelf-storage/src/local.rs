//! Legacy disk backend. Files land under `{root}/{folder}/{file_name}`
//! and are served by the web tier at `{public_prefix}/...`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use studyshelf_core::{Error, Result};

use crate::{ObjectStore, StorageKind, StoredObject};

pub struct LocalStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn store(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        file_name: &str,
        kind: StorageKind,
    ) -> Result<StoredObject> {
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("cannot create {}: {e}", dir.display())))?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::Storage(format!("cannot write {}: {e}", path.display())))?;

        let storage_id = format!("{folder}/{file_name}");
        Ok(StoredObject {
            url: format!("{}/{storage_id}", self.public_prefix),
            storage_id,
            kind,
        })
    }

    async fn remove(&self, storage_id: &str, _kind: StorageKind) -> Result<()> {
        // Relative ids only; a traversal in a stored id would escape root.
        if storage_id.contains("..") || storage_id.starts_with('/') {
            return Err(Error::Storage(format!("invalid storage id {storage_id}")));
        }
        let path = self.root.join(storage_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone counts as removed.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }
}
