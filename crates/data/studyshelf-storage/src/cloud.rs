//! Cloudinary-style cloud backend.
//!
//! Upload and destroy are POSTs against
//! `{base}/{cloud_name}/{resource_type}/{action}`, authenticated by a sha1
//! signature over the alphabetically sorted request params plus the API
//! secret. Only the fields the provider echoes back (URL and public id)
//! are kept.

use async_trait::async_trait;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use studyshelf_core::{Error, Result};

use crate::{ObjectStore, StorageKind, StoredObject};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

pub struct CloudStore {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl CloudStore {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point at a non-default API host (test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, kind: StorageKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{action}",
            self.base_url,
            self.cloud_name,
            kind.as_str()
        )
    }

    fn signature(&self, params: &[(&str, &str)]) -> String {
        sign(params, &self.api_secret)
    }
}

/// Params sorted by key, joined `k=v&...`; `file`, `api_key` and the
/// resource type never participate.
fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(secret.as_bytes());
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl ObjectStore for CloudStore {
    async fn store(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        file_name: &str,
        kind: StorageKind,
    ) -> Result<StoredObject> {
        // public_id is the name without extension; the provider keeps the
        // extension from the uploaded file itself.
        let public_id = file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name)
            .to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.signature(&[
            ("folder", folder),
            ("public_id", &public_id),
            ("timestamp", &timestamp),
        ]);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("public_id", public_id)
            .text("folder", folder.to_string())
            .part("file", part);

        let resp = self
            .http
            .post(self.endpoint(kind, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("upload failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Storage(format!("upload failed ({status}): {body}")));
        }

        let uploaded: UploadResponse = resp
            .json()
            .await
            .map_err(|e| Error::Storage(format!("bad upload response: {e}")))?;

        tracing::debug!(public_id = %uploaded.public_id, "uploaded object");
        Ok(StoredObject {
            url: uploaded.secure_url,
            storage_id: uploaded.public_id,
            kind,
        })
    }

    async fn remove(&self, storage_id: &str, kind: StorageKind) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature =
            self.signature(&[("public_id", storage_id), ("timestamp", &timestamp)]);

        let resp = self
            .http
            .post(self.endpoint(kind, "destroy"))
            .form(&[
                ("public_id", storage_id),
                ("timestamp", &timestamp),
                ("api_key", &self.api_key),
                ("signature", &signature),
            ])
            .send()
            .await
            .map_err(|e| Error::Storage(format!("destroy failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(Error::Storage(format!("destroy failed ({status})")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_to_sign_sorts_params() {
        let s = string_to_sign(&[
            ("timestamp", "99"),
            ("folder", "materials"),
            ("public_id", "abc"),
        ]);
        assert_eq!(s, "folder=materials&public_id=abc&timestamp=99");
    }

    #[test]
    fn sha1_matches_known_vector() {
        // sha1("abc")
        let mut hasher = Sha1::new();
        hasher.update(b"abc");
        assert_eq!(
            hex(&hasher.finalize()),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn signature_is_stable_under_param_order() {
        let a = sign(&[("b", "2"), ("a", "1")], "s");
        let b = sign(&[("a", "1"), ("b", "2")], "s");
        assert_eq!(a, b);
    }

    #[test]
    fn endpoints_split_by_resource_kind() {
        let store = CloudStore::new("demo", "key", "secret");
        assert_eq!(
            store.endpoint(StorageKind::Image, "upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            store.endpoint(StorageKind::Raw, "destroy"),
            "https://api.cloudinary.com/v1_1/demo/raw/destroy"
        );
    }
}
