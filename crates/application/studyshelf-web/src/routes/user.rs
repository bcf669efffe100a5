use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use studyshelf_core::{Error, NewUser, Role};

use crate::auth::{hash_password, verify_password};
use crate::routes::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Deserialize)]
struct RegisterForm {
    name: String,
    email: String,
    password: String,
    role: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegisterForm>,
) -> ApiResult<impl IntoResponse> {
    let role = form.role.as_deref().map(Role::parse).unwrap_or(Role::User);
    state
        .store
        .create_user(NewUser {
            name: form.name,
            email: form.email,
            role,
            password_digest: hash_password(&form.password),
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "msg": "User Created Successfully" })),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .store
        .user_by_email(&form.email)
        .await?
        .ok_or_else(|| Error::NotFound("User Not Found".into()))?;

    if !verify_password(&form.password, &user.password_digest) {
        return Err(Error::Unauthorized("Wrong Password".into()).into());
    }

    let token = state.auth.issue(&user)?;
    Ok(Json(json!({ "success": true, "user": user, "token": token })))
}
