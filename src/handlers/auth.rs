use axum::{
    extract::{Extension, State},
    Json,
};
use std::sync::Arc;
use crate::AppState;
use crate::error::AppResult;
use crate::handlers::ApiJson;
use crate::models::user::{AdminProfile, LoginRequest, LoginResponse};
use crate::services::auth::{self, Claims};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = auth::login(&state.db, &state.config.jwt_secret, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current administrator", body = AdminProfile),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<AdminProfile>> {
    let profile = auth::me(&state.db, &claims).await?;
    Ok(Json(profile))
}
