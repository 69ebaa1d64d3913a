//! Authentication middleware.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

/// Authenticated caller, attached to every request behind the auth layer.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
}

fn unauthorized(error: &str, code: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": error, "code": code})),
    )
        .into_response()
}

/// Validates JWT access tokens and stores the caller identity in request
/// extensions. Tokens missing either identity claim are rejected.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("Missing authorization header", "MISSING_AUTH_HEADER"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid authorization header format", "INVALID_AUTH_FORMAT"))?;

    let claims = state
        .jwt_keys
        .verify_access_token(token)
        .map_err(|_| unauthorized("Invalid or expired token", "INVALID_TOKEN"))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| unauthorized("Invalid or expired token", "INVALID_TOKEN"))?;
    let client_id = Uuid::parse_str(&claims.client_id)
        .map_err(|_| unauthorized("Invalid or expired token", "INVALID_TOKEN"))?;

    req.extensions_mut().insert(AuthContext {
        user_id,
        client_id,
        name: claims.name,
    });
    Ok(next.run(req).await)
}
