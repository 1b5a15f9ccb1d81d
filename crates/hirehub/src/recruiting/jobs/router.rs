use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::domain::{JobDraft, JobId, JobQuery};
use super::repository::JobRepository;
use super::service::JobService;
use crate::recruiting::access::Actor;
use crate::recruiting::error::RecruitingError;

/// Router exposing posting endpoints.
pub fn job_router<J>(service: Arc<JobService<J>>) -> Router
where
    J: JobRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(search_handler::<J>).post(create_handler::<J>),
        )
        .route("/api/v1/jobs/recruiter", get(mine_handler::<J>))
        .route("/api/v1/jobs/:job_id", get(fetch_handler::<J>))
        .with_state(service)
}

pub(crate) async fn create_handler<J>(
    State(service): State<Arc<JobService<J>>>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> Result<Response, RecruitingError>
where
    J: JobRepository + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let job = service.create(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

pub(crate) async fn search_handler<J>(
    State(service): State<Arc<JobService<J>>>,
    Query(query): Query<JobQuery>,
) -> Result<Response, RecruitingError>
where
    J: JobRepository + 'static,
{
    let page = service.search(&query)?;
    Ok((StatusCode::OK, Json(page)).into_response())
}

pub(crate) async fn mine_handler<J>(
    State(service): State<Arc<JobService<J>>>,
    headers: HeaderMap,
) -> Result<Response, RecruitingError>
where
    J: JobRepository + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let jobs = service.mine(&actor)?;
    Ok((StatusCode::OK, Json(jobs)).into_response())
}

pub(crate) async fn fetch_handler<J>(
    State(service): State<Arc<JobService<J>>>,
    Path(job_id): Path<String>,
) -> Result<Response, RecruitingError>
where
    J: JobRepository + 'static,
{
    let job = service.get(&JobId(job_id))?;
    Ok((StatusCode::OK, Json(job)).into_response())
}
