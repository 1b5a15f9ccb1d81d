use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use hirehub::recruiting::applications::{application_router, ApplicationService};
use hirehub::recruiting::jobs::{job_router, JobService};
use hirehub::recruiting::profiles::profile_router;
use serde_json::json;

use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryJobRepository, InMemoryOutbox,
    InMemoryProfileDirectory,
};

pub(crate) type Applications = ApplicationService<InMemoryApplicationRepository, InMemoryOutbox>;

/// Everything the HTTP surface needs to serve requests.
pub(crate) struct Services {
    pub(crate) jobs: Arc<JobService<InMemoryJobRepository>>,
    pub(crate) applications: Arc<Applications>,
    pub(crate) profiles: Arc<InMemoryProfileDirectory>,
}

pub(crate) fn with_board_routes(services: Services) -> Router {
    job_router(services.jobs)
        .merge(application_router(services.applications))
        .merge(profile_router(services.profiles))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Relaxed) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
