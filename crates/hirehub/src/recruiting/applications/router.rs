use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use super::domain::{ApplicationId, ApplicationSubmission, FeedbackSubmission, StatusUpdate};
use super::repository::ApplicationRepository;
use super::service::ApplicationService;
use crate::recruiting::access::Actor;
use crate::recruiting::error::RecruitingError;
use crate::recruiting::events::EventOutbox;
use crate::recruiting::jobs::JobId;

/// Set on ranking responses when some score writes did not land.
pub const RANKING_WRITE_FAILURES_HEADER: &str = "x-ranking-write-failures";

/// Router builder exposing HTTP endpoints for applications and ranking.
pub fn application_router<R, O>(service: Arc<ApplicationService<R, O>>) -> Router
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<R, O>))
        .route("/api/v1/applications/user", get(mine_handler::<R, O>))
        .route(
            "/api/v1/applications/recruiter",
            get(recruiter_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/job/:job_id",
            get(job_applications_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/job/:job_id/rank",
            get(rank_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(fetch_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/:application_id/feedback",
            post(feedback_handler::<R, O>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
    Json(submission): Json<ApplicationSubmission>,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let record = service.submit(&actor, submission)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn mine_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let records = service.mine(&actor)?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

pub(crate) async fn recruiter_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let records = service.for_recruiter(&actor)?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

pub(crate) async fn job_applications_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let records = service.for_job(&actor, &JobId(job_id))?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

pub(crate) async fn rank_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let outcome = service.rank(&actor, &JobId(job_id)).await?;

    let mut response = (StatusCode::OK, Json(outcome.applications)).into_response();
    if !outcome.persistence.is_complete() {
        response.headers_mut().insert(
            HeaderName::from_static(RANKING_WRITE_FAILURES_HEADER),
            HeaderValue::from(outcome.persistence.failed),
        );
    }
    Ok(response)
}

pub(crate) async fn fetch_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let record = service.get(&actor, &ApplicationId(application_id))?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn status_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let record =
        service.update_status(&actor, &ApplicationId(application_id), update.status)?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn feedback_handler<R, O>(
    State(service): State<Arc<ApplicationService<R, O>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(submission): Json<FeedbackSubmission>,
) -> Result<Response, RecruitingError>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let record = service.add_feedback(&actor, &ApplicationId(application_id), submission)?;
    Ok((StatusCode::OK, Json(record)).into_response())
}
