use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::middleware::require_admin;
use crate::routes::ApiResult;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/add", post(add_chapter))
        .route("/update/{id}", put(update_chapter))
        .route("/delete/{id}", delete(delete_chapter))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route("/chapters/{subjectId}", get(get_chapters))
        .route("/getchapter/{id}", get(get_chapter))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddChapterForm {
    subject_id: String,
    chapter_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameChapterForm {
    chapter_name: String,
}

async fn add_chapter(
    State(state): State<Arc<AppState>>,
    Json(form): Json<AddChapterForm>,
) -> ApiResult<impl IntoResponse> {
    let (chapter, subject) = state
        .hierarchy
        .add_chapter(&form.subject_id, &form.chapter_name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "msg": format!(
                "Chapter \"{}\" created under subject: {}",
                chapter.chapter_name, subject.name
            ),
            "chapter": chapter,
        })),
    ))
}

async fn get_chapters(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.store.subject(&subject_id).await?;
    let chapters = state.store.chapters_by_subject(&subject_id).await?;
    Ok(Json(json!({ "success": true, "chapters": chapters })))
}

async fn get_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let chapter = state.store.chapter(&id).await?;
    Ok(Json(json!({ "success": true, "chapter": chapter })))
}

async fn update_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<RenameChapterForm>,
) -> ApiResult<impl IntoResponse> {
    let chapter = state.store.rename_chapter(&id, &form.chapter_name).await?;
    Ok(Json(json!({
        "success": true,
        "msg": format!("Chapter renamed to \"{}\"", chapter.chapter_name),
        "chapter": chapter,
    })))
}

async fn delete_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let chapter = state.hierarchy.delete_chapter(&id).await?;
    Ok(Json(json!({
        "success": true,
        "msg": format!(
            "Chapter \"{}\" and all its exercises/materials deleted",
            chapter.chapter_name
        ),
    })))
}
