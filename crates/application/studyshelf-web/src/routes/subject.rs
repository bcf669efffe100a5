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
        .route("/add", post(add_subject))
        .route("/update/{id}", put(update_subject))
        .route("/delete/{id}", delete(delete_subject))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route("/subjects", get(get_subjects))
        .route("/getsubject/{id}", get(get_subject))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectForm {
    subject_name: String,
}

async fn add_subject(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SubjectForm>,
) -> ApiResult<impl IntoResponse> {
    let subject = state.store.create_subject(&form.subject_name).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "msg": format!("Subject: \"{}\" Created", subject.name),
        })),
    ))
}

async fn get_subjects(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let subjects = state.store.subjects().await?;
    Ok(Json(json!({ "success": true, "subjects": subjects })))
}

async fn get_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let subject = state.store.subject(&id).await?;
    Ok(Json(json!({ "success": true, "subject": subject })))
}

async fn update_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<SubjectForm>,
) -> ApiResult<impl IntoResponse> {
    let subject = state.store.rename_subject(&id, &form.subject_name).await?;
    Ok(Json(json!({
        "success": true,
        "msg": format!("Subject renamed to \"{}\"", subject.name),
        "subject": subject,
    })))
}

async fn delete_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let subject = state.hierarchy.delete_subject(&id).await?;
    Ok(Json(json!({
        "success": true,
        "msg": format!(
            "Subject \"{}\" and all its chapters, exercises, and materials have been deleted",
            subject.name
        ),
    })))
}
