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
        .route("/add", post(add_exercise))
        .route("/update/{id}", put(update_exercise))
        .route("/delete/{id}", delete(delete_exercise))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route("/exercises/{chapterId}", get(get_exercises))
        .route("/getexercise/{id}", get(get_exercise))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddExerciseForm {
    chapter_id: String,
    exercise_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameExerciseForm {
    exercise_name: String,
}

async fn add_exercise(
    State(state): State<Arc<AppState>>,
    Json(form): Json<AddExerciseForm>,
) -> ApiResult<impl IntoResponse> {
    let (exercise, chapter) = state
        .hierarchy
        .add_exercise(&form.chapter_id, &form.exercise_name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "msg": format!(
                "Chapter: {} -> Exercise \"{}\" is created",
                chapter.chapter_name, exercise.exercise_name
            ),
            "exercise": exercise,
        })),
    ))
}

async fn get_exercises(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.store.chapter(&chapter_id).await?;
    let exercises = state.store.exercises_by_chapter(&chapter_id).await?;
    Ok(Json(json!({ "success": true, "exercises": exercises })))
}

async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let exercise = state.store.exercise(&id).await?;
    Ok(Json(json!({ "success": true, "exercise": exercise })))
}

async fn update_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<RenameExerciseForm>,
) -> ApiResult<impl IntoResponse> {
    let exercise = state
        .store
        .rename_exercise(&id, &form.exercise_name)
        .await?;
    Ok(Json(json!({
        "success": true,
        "msg": format!("Exercise renamed to \"{}\"", exercise.exercise_name),
        "exercise": exercise,
    })))
}

async fn delete_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let exercise = state.hierarchy.delete_exercise(&id).await?;
    Ok(Json(json!({
        "success": true,
        "msg": format!(
            "Exercise \"{}\" and its materials deleted",
            exercise.exercise_name
        ),
    })))
}
