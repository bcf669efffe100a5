use std::sync::Arc;

use anyhow::{bail, Context};
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use studyshelf_config::{Config, StorageConfig};
use studyshelf_mongodb::MongoStore;
use studyshelf_storage::{CloudStore, LocalStore, ObjectStore};
use studyshelf_web::auth::TokenAuth;
use studyshelf_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;
    if config.auth.token_secret.is_empty() {
        bail!("auth.token_secret is not set (file or STUDYSHELF_TOKEN_SECRET)");
    }

    let store = MongoStore::connect(&config.mongo_uri, &config.mongo_db)
        .await
        .context("failed to connect to mongodb")?;

    let mut static_uploads = None;
    let objects: Arc<dyn ObjectStore> = match &config.storage {
        StorageConfig::Local {
            root,
            public_prefix,
        } => {
            static_uploads = Some((public_prefix.clone(), root.clone()));
            Arc::new(LocalStore::new(root.clone(), public_prefix))
        }
        StorageConfig::Cloud {
            cloud_name,
            api_key,
            api_secret,
        } => Arc::new(CloudStore::new(cloud_name, api_key, api_secret)),
    };

    let state = Arc::new(AppState::new(
        Arc::new(store),
        objects,
        TokenAuth::new(&config.auth.token_secret, config.auth.token_ttl_secs),
        config.max_upload_bytes,
    ));

    let mut app = studyshelf_web::app(state);
    if let Some((prefix, root)) = static_uploads {
        app = app.nest_service(&prefix, ServeDir::new(root));
    }

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, "studyshelf listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
