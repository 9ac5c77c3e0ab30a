use axum::{
    extract::{Extension, State},
    Json,
};
use std::sync::Arc;
use crate::AppState;
use crate::error::AppResult;
use crate::handlers::ApiQuery;
use crate::models::stats::{BudgetCount, StatusSummary, SubjectCount, TimelinePoint, TimelineQuery};
use crate::models::user::Capability;
use crate::services::auth::Claims;
use crate::services::stats;

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Counts per status", body = StatusSummary)
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<StatusSummary>> {
    claims.require_capability(Capability::ViewStatistics)?;
    Ok(Json(stats::summary(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/stats/subjects",
    tag = "stats",
    responses(
        (status = 200, description = "Counts per subject", body = Vec<SubjectCount>)
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn subjects(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<SubjectCount>>> {
    claims.require_capability(Capability::ViewStatistics)?;
    Ok(Json(stats::by_subject(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/stats/budgets",
    tag = "stats",
    responses(
        (status = 200, description = "Counts per budget bracket", body = Vec<BudgetCount>)
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn budgets(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BudgetCount>>> {
    claims.require_capability(Capability::ViewStatistics)?;
    Ok(Json(stats::by_budget(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/stats/timeline",
    tag = "stats",
    params(TimelineQuery),
    responses(
        (status = 200, description = "Daily counts, oldest first", body = Vec<TimelinePoint>),
        (status = 400, description = "days out of range")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn timeline(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<TimelineQuery>,
) -> AppResult<Json<Vec<TimelinePoint>>> {
    claims.require_capability(Capability::ViewStatistics)?;
    let days = stats::timeline_days(query.days)?;
    Ok(Json(stats::timeline(&state.db, days).await?))
}
