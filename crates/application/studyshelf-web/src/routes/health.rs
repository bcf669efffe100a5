use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // A datastore round trip doubles as the liveness check.
    let store_ok = state.store.subjects().await.is_ok();
    Json(json!({
        "service": "studyshelf",
        "version": env!("CARGO_PKG_VERSION"),
        "store": if store_ok { "ok" } else { "unreachable" },
    }))
}
