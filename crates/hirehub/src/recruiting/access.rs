use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use super::applications::ApplicationRecord;
use super::error::RecruitingError;
use super::jobs::JobPosting;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Identifier issued by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Recruiter,
    JobSeeker,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recruiter" => Some(Self::Recruiter),
            "jobseeker" | "job_seeker" | "job-seeker" => Some(Self::JobSeeker),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Recruiter => "recruiter",
            Role::JobSeeker => "jobSeeker",
        }
    }
}

/// Authenticated caller as resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn recruiter(id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(id.into()),
            role: Role::Recruiter,
        }
    }

    pub fn job_seeker(id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(id.into()),
            role: Role::JobSeeker,
        }
    }

    /// Read the identity forwarded by the authenticating proxy.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, RecruitingError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| RecruitingError::Unauthorized("no token".to_string()))?;

        let role = headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Role::parse)
            .ok_or_else(|| RecruitingError::Unauthorized("token failed".to_string()))?;

        Ok(Self {
            user_id: UserId(user_id.to_string()),
            role,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateJob,
    ListOwnJobs,
    ApplyTo,
    ListOwnApplications,
    ListRecruiterApplications,
    ReadApplication,
    UpdateStatus,
    AddFeedback,
    ListForJob,
    RankForJob,
}

impl Action {
    pub const fn label(self) -> &'static str {
        match self {
            Action::CreateJob => "create jobs",
            Action::ListOwnJobs => "list recruiter jobs",
            Action::ApplyTo => "apply to this job",
            Action::ListOwnApplications => "list applications as a job seeker",
            Action::ListRecruiterApplications => "list applications as a recruiter",
            Action::ReadApplication => "view this application",
            Action::UpdateStatus => "update this application",
            Action::AddFeedback => "add feedback to this application",
            Action::ListForJob => "view these applications",
            Action::RankForJob => "rank these applications",
        }
    }
}

/// Target of an authorization decision.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    JobBoard,
    Job(&'a JobPosting),
    Application(&'a ApplicationRecord),
}

/// How an actor relates to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Recruiter,
    Applicant,
}

impl Resource<'_> {
    pub fn ownership(&self, actor: &Actor) -> Option<Ownership> {
        match self {
            Resource::JobBoard => None,
            Resource::Job(job) => (job.recruiter == actor.user_id).then_some(Ownership::Recruiter),
            Resource::Application(record) => {
                if record.recruiter == actor.user_id {
                    Some(Ownership::Recruiter)
                } else if record.applicant == actor.user_id {
                    Some(Ownership::Applicant)
                } else {
                    None
                }
            }
        }
    }
}

pub trait AccessPolicy: Send + Sync {
    fn can_act(&self, actor: &Actor, resource: &Resource<'_>, action: Action) -> bool;

    fn authorize(
        &self,
        actor: &Actor,
        resource: &Resource<'_>,
        action: Action,
    ) -> Result<(), RecruitingError> {
        if self.can_act(actor, resource, action) {
            Ok(())
        } else {
            Err(RecruitingError::Forbidden(action))
        }
    }
}

/// Role plus ownership rules for the job board.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipPolicy;

impl AccessPolicy for OwnershipPolicy {
    fn can_act(&self, actor: &Actor, resource: &Resource<'_>, action: Action) -> bool {
        let ownership = resource.ownership(actor);
        match (action, resource) {
            (Action::CreateJob | Action::ListOwnJobs | Action::ListRecruiterApplications, _) => {
                actor.role == Role::Recruiter
            }
            (Action::ListOwnApplications, _) => actor.role == Role::JobSeeker,
            (Action::ApplyTo, Resource::Job(_)) => actor.role == Role::JobSeeker,
            (Action::ReadApplication, Resource::Application(_)) => ownership.is_some(),
            (
                Action::UpdateStatus | Action::AddFeedback,
                Resource::Application(_),
            )
            | (Action::ListForJob | Action::RankForJob, Resource::Job(_)) => {
                actor.role == Role::Recruiter && ownership == Some(Ownership::Recruiter)
            }
            _ => false,
        }
    }
}
