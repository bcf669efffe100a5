//! studyshelf-config -- server configuration.
//!
//! An optional YAML file provides the base (path from `STUDYSHELF_CONFIG`,
//! falling back to `~/.config/studyshelf/config.yaml`), then environment
//! variables override the operational knobs so an env-only deployment
//! works with no file at all.

use std::path::PathBuf;

use serde::Deserialize;

use studyshelf_core::{Error, Result};

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_MONGO_URI: &str = "mongodb://127.0.0.1:27017";
pub const DEFAULT_MONGO_DB: &str = "studyshelf";
/// Upload cap, matching the original middleware's 20 MB limit.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub mongo_uri: String,
    pub mongo_db: String,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key for bearer tokens. Must be set (file or env) before the
    /// server will issue or accept tokens.
    pub token_secret: String,
    pub token_ttl_secs: u64,
}

/// Which object-store backend holds uploaded materials.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Legacy disk backend, served statically under `public_prefix`.
    Local {
        root: PathBuf,
        public_prefix: String,
    },
    /// Cloudinary-style cloud backend.
    Cloud {
        cloud_name: String,
        api_key: String,
        api_secret: String,
    },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: DEFAULT_BIND.to_string(),
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            mongo_db: DEFAULT_MONGO_DB.to_string(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            token_secret: String::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local {
            root: PathBuf::from("uploads"),
            public_prefix: "/u".to_string(),
        }
    }
}

impl Config {
    /// File (if any) merged with env overrides.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Internal(format!("cannot read config {}: {e}", path.display()))
                })?;
                Self::from_yaml(&raw)?
            }
            _ => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| Error::Internal(format!("invalid config: {e}")))
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("STUDYSHELF_BIND") {
            self.bind = v;
        }
        if let Ok(v) = std::env::var("MONGO_URI") {
            self.mongo_uri = v;
        }
        if let Ok(v) = std::env::var("MONGO_DB") {
            self.mongo_db = v;
        }
        if let Ok(v) = std::env::var("STUDYSHELF_TOKEN_SECRET") {
            self.auth.token_secret = v;
        }
        // All three Cloudinary vars switch the backend over.
        if let (Ok(cloud_name), Ok(api_key), Ok(api_secret)) = (
            std::env::var("CLOUDINARY_CLOUD_NAME"),
            std::env::var("CLOUDINARY_API_KEY"),
            std::env::var("CLOUDINARY_API_SECRET"),
        ) {
            self.storage = StorageConfig::Cloud {
                cloud_name,
                api_key,
                api_secret,
            };
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("STUDYSHELF_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("studyshelf/config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local_storage_on_port_5000() {
        let config = Config::default();
        assert_eq!(config.bind, "0.0.0.0:5000");
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn yaml_selects_cloud_backend() {
        let raw = r#"
bind: "127.0.0.1:8080"
mongo_db: shelf_test
auth:
  token_secret: sekrit
storage:
  backend: cloud
  cloud_name: demo
  api_key: key
  api_secret: secret
"#;
        let config = Config::from_yaml(raw).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.mongo_db, "shelf_test");
        assert_eq!(config.auth.token_secret, "sekrit");
        match config.storage {
            StorageConfig::Cloud { ref cloud_name, .. } => assert_eq!(cloud_name, "demo"),
            _ => panic!("expected cloud backend"),
        }
        // Unset fields keep defaults.
        assert_eq!(config.mongo_uri, DEFAULT_MONGO_URI);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("mongo_uri: mongodb://db:27017\n").unwrap();
        assert_eq!(config.mongo_uri, "mongodb://db:27017");
        assert_eq!(config.bind, DEFAULT_BIND);
    }
}
