use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::json;

use studyshelf_core::{Error, ParentRef};

use crate::ingest;
use crate::middleware::require_admin;
use crate::routes::ApiResult;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/add", post(add_material))
        .route("/update/{id}", put(update_material))
        .route("/delete/{id}", delete(delete_material))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route("/getmaterials/{level}/{id}", get(get_materials))
        .route("/getmaterial/{id}", get(get_material))
}

async fn add_material(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let upload = ingest::read_upload(multipart).await?;
    let material = ingest::add_material(&state, upload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "msg": "Material added successfully",
            "material": material,
        })),
    ))
}

async fn get_materials(
    State(state): State<Arc<AppState>>,
    Path((level, id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let parent = match level.as_str() {
        "subject" => ParentRef::Subject(id),
        "chapter" => ParentRef::Chapter(id),
        "exercise" => ParentRef::Exercise(id),
        _ => {
            return Err(Error::Validation(
                "Please provide subjectId, chapterId, or exerciseId".into(),
            )
            .into())
        }
    };
    let materials = state.store.materials_by_parent(&parent).await?;
    Ok(Json(json!({ "success": true, "materials": materials })))
}

async fn get_material(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let material = state.store.material(&id).await?;
    Ok(Json(json!({ "success": true, "material": material })))
}

async fn update_material(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let upload = ingest::read_upload(multipart).await?;
    let material = ingest::update_material(&state, &id, upload).await?;
    Ok(Json(json!({
        "success": true,
        "msg": "Material updated successfully",
        "material": material,
    })))
}

async fn delete_material(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.hierarchy.delete_material(&id).await?;
    Ok(Json(json!({
        "success": true,
        "msg": "Material deleted successfully",
    })))
}
