//! studyshelf-web -- JSON API over the study-content hierarchy.
//!
//! Each resource gets its own route module exposing `router()`; mutating
//! routes sit behind the bearer-token middleware. The router is built
//! here so integration tests can drive it without binding a socket.

pub mod auth;
pub mod hierarchy;
pub mod ingest;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    // Multipart framing overhead on top of the payload cap.
    let material_body_limit = state.max_upload_bytes + 1024 * 1024;

    Router::new()
        .nest("/subject", routes::subject::router(state.clone()))
        .nest("/chapter", routes::chapter::router(state.clone()))
        .nest("/exercise", routes::exercise::router(state.clone()))
        .nest(
            "/material",
            routes::material::router(state.clone())
                .layer(DefaultBodyLimit::max(material_body_limit)),
        )
        .nest("/user", routes::user::router())
        .merge(routes::health::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
