use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use crate::AppState;
use crate::handlers::health::not_found;

/// Dashboard page; the JSON 404 when it is not deployed.
pub async fn admin_page(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let page = ServeFile::new(state.config.static_dir.join("admin.html"));
    match page.oneshot(req).await {
        Ok(res) if res.status() != StatusCode::NOT_FOUND => res.into_response(),
        _ => not_found().await.into_response(),
    }
}
