use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jobscout_core::models::ScrapeQuery;
use jobscout_core::traits::SessionProvider;

use crate::dto::{HealthResponse, ScrapeJobsParams, ScrapeJobsResponse};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes.
pub fn router<P: SessionProvider>(state: Arc<AppState<P>>) -> Router {
    Router::new()
        .route("/scrape-jobs", get(scrape_jobs::<P>))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/scrape-jobs",
    params(ScrapeJobsParams),
    responses(
        (status = 200, description = "Merged listings from the selected sources", body = ScrapeJobsResponse),
        (status = 400, description = "Invalid query", body = crate::dto::ErrorResponse),
        (status = 503, description = "No browser session could be opened", body = crate::dto::ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn scrape_jobs<P: SessionProvider>(
    State(state): State<Arc<AppState<P>>>,
    Query(params): Query<ScrapeJobsParams>,
) -> Result<axum::Json<ScrapeJobsResponse>, ApiError> {
    let query = ScrapeQuery::validate(
        params.into(),
        state.orchestrator.registry(),
        state.default_max_results,
    )?;

    tracing::info!(
        title = %query.title(),
        location = %query.location(),
        platform = %query.platform(),
        max_results = query.max_results(),
        "Scrape requested"
    );

    let result = state.orchestrator.scrape(&query).await?;

    Ok(axum::Json(result.into()))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(HealthResponse { status: "ok" }))
}
