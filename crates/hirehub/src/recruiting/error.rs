use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::access::Action;
use super::repository::RepositoryError;

/// Failure taxonomy surfaced by the job and application services.
#[derive(Debug, thiserror::Error)]
pub enum RecruitingError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("not authorized to {}", .0.label())]
    Forbidden(Action),
    #[error("not authorized, {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Duplicate(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RecruitingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecruitingError::NotFound(_) => StatusCode::NOT_FOUND,
            RecruitingError::Forbidden(_) => StatusCode::FORBIDDEN,
            RecruitingError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            RecruitingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RecruitingError::Duplicate(_) | RecruitingError::Repository(RepositoryError::Conflict) => {
                StatusCode::CONFLICT
            }
            RecruitingError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            RecruitingError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RecruitingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
