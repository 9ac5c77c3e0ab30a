use std::sync::Arc;

use axum::{
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::handlers;
use crate::middleware::{auth_middleware, expose_error_details, require_admin};
use crate::AppState;

/// Wraps a method router with bearer authentication and the admin role
/// check. Authentication runs first.
fn protect(
    router: MethodRouter<Arc<AppState>>,
    state: &Arc<AppState>,
) -> MethodRouter<Arc<AppState>> {
    router
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_files = ServeDir::new(&static_dir)
        .not_found_service(handlers::health::not_found.into_service());

    let router = Router::new()
        // Auth
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", protect(get(handlers::auth::me), &state))
        // Contact requests
        .route(
            "/api/contact",
            post(handlers::contact::create_contact)
                .merge(protect(get(handlers::contact::list_contacts), &state)),
        )
        .route(
            "/api/contact/:id",
            protect(
                get(handlers::contact::get_contact)
                    .patch(handlers::contact::update_contact)
                    .delete(handlers::contact::delete_contact),
                &state,
            ),
        )
        // Statistics
        .route("/api/stats", protect(get(handlers::stats::summary), &state))
        .route("/api/stats/subjects", protect(get(handlers::stats::subjects), &state))
        .route("/api/stats/budgets", protect(get(handlers::stats::budgets), &state))
        .route("/api/stats/timeline", protect(get(handlers::stats::timeline), &state))
        .route("/api/health", get(handlers::health::health))
        // Frontend
        .route("/admin", get(handlers::pages::admin_page))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_files);

    let router = if state.config.is_production() {
        router
    } else {
        router.layer(middleware::from_fn(expose_error_details))
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
