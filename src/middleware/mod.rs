use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{AppError, ErrorDetail};
use crate::models::user::Role;
use crate::services::auth::{verify_token, Claims};
use crate::AppState;

/// Validates the bearer token and stores its claims as a request extension.
/// Rejects before any handler (and so any store access) runs.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token required".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Token required".into()))?;

    let claims = verify_token(token, &state.config.jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Must be layered inside `auth_middleware`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("Token required".into()))?;
    claims.require_role(Role::Admin)?;
    Ok(next.run(req).await)
}

/// Adds the cause of a 500 to its body as `message`. Layered only outside
/// production.
pub async fn expose_error_details(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let detail = response.extensions_mut().remove::<ErrorDetail>();
    match detail {
        Some(ErrorDetail(message)) => (
            response.status(),
            Json(json!({ "error": "Internal server error", "message": message })),
        )
            .into_response(),
        None => response,
    }
}
