use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::access::{Actor, Role, UserId};
use super::error::RecruitingError;
use super::repository::RepositoryError;

/// User record as kept by the identity side of the system.
///
/// `skills` and `experience` are optional because older accounts never filled
/// them in; scoring reads them through [`UserProfile::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience: Option<f64>,
}

impl UserProfile {
    pub fn snapshot(&self) -> ApplicantSnapshot {
        ApplicantSnapshot::new(self.skills.clone().unwrap_or_default(), self.experience)
    }
}

/// The public subset of a job seeker's profile used for scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSnapshot {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: f64,
}

impl ApplicantSnapshot {
    /// Missing, negative, or non-finite experience collapses to zero.
    pub fn new(skills: Vec<String>, experience: Option<f64>) -> Self {
        let experience = experience
            .filter(|years| years.is_finite() && *years > 0.0)
            .unwrap_or(0.0);
        Self { skills, experience }
    }
}

pub trait ProfileDirectory: Send + Sync {
    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError>;
}

/// Self-service edits a caller may make to their own profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience: Option<f64>,
}

impl ProfileUpdate {
    fn into_profile(self, actor: &Actor) -> Result<UserProfile, RecruitingError> {
        if self.name.trim().is_empty() {
            return Err(RecruitingError::Validation("please add a name".to_string()));
        }
        if !looks_like_email(&self.email) {
            return Err(RecruitingError::Validation(
                "please add a valid email".to_string(),
            ));
        }
        if actor.role == Role::Recruiter
            && self.company.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(RecruitingError::Validation(
                "recruiters must name a company".to_string(),
            ));
        }
        if matches!(self.experience, Some(years) if !years.is_finite() || years < 0.0) {
            return Err(RecruitingError::Validation(
                "experience must be a non-negative number of years".to_string(),
            ));
        }

        Ok(UserProfile {
            user_id: actor.user_id.clone(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: actor.role,
            company: self.company,
            skills: self.skills,
            experience: self.experience,
        })
    }
}

fn looks_like_email(raw: &str) -> bool {
    let raw = raw.trim();
    match raw.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
        }
        None => false,
    }
}

/// Routes for reading and editing the caller's own profile.
pub fn profile_router<P>(directory: Arc<P>) -> Router
where
    P: ProfileDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/profile",
            get(fetch_handler::<P>).put(upsert_handler::<P>),
        )
        .with_state(directory)
}

pub(crate) async fn fetch_handler<P>(
    State(directory): State<Arc<P>>,
    headers: HeaderMap,
) -> Result<Response, RecruitingError>
where
    P: ProfileDirectory + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let profile = directory
        .fetch(&actor.user_id)?
        .ok_or(RecruitingError::NotFound("profile"))?;
    Ok((StatusCode::OK, Json(profile)).into_response())
}

pub(crate) async fn upsert_handler<P>(
    State(directory): State<Arc<P>>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, RecruitingError>
where
    P: ProfileDirectory + 'static,
{
    let actor = Actor::from_headers(&headers)?;
    let profile = update.into_profile(&actor)?;
    let stored = directory.upsert(profile)?;
    Ok((StatusCode::OK, Json(stored)).into_response())
}
