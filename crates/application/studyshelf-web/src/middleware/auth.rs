//! Admin auth middleware -- validates bearer tokens on mutating routes.
//!
//! The verified [`Claims`] land in request extensions so handlers can read
//! the caller's identity without touching the token again.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use studyshelf_core::{Error, Result, Role};

use crate::auth::Claims;
use crate::routes::ApiError;
use crate::state::AppState;

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let claims = authenticate(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn authenticate(state: &AppState, req: &Request) -> Result<Claims> {
    let token = bearer_token(req)?;
    let claims = state.auth.verify(token)?;
    if claims.role != Role::Admin {
        return Err(Error::Unauthorized("Admin access required".into()));
    }
    Ok(claims)
}

fn bearer_token(req: &Request) -> Result<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Unauthorized("No token provided".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/subject/add");
        if let Some(value) = header {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(bearer_token(&request(None)).is_err());
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        assert!(bearer_token(&request(Some("Basic abc"))).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(bearer_token(&request(Some("Bearer abc"))).unwrap(), "abc");
    }
}
