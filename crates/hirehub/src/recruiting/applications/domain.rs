use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recruiting::access::UserId;
use crate::recruiting::jobs::JobId;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Hiring pipeline position of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    Applied,
    #[serde(rename = "Under Review")]
    UnderReview,
    Shortlisted,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    Offered,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Hired => "Hired",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

/// A rated comment left by the recruiter at some review stage. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub rating: u8,
    pub comment: String,
    pub stage: String,
    pub created_at: DateTime<Utc>,
}

/// Score cached from the most recent ranking pass for the application's job.
///
/// Never a source of truth: every ranking request recomputes it in full from
/// the job requirements, the applicant profile, and the feedback history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedRanking {
    pub score: i64,
    pub computed_at: Option<DateTime<Utc>>,
}

/// Stored application for one (job, applicant) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: UserId,
    pub recruiter: UserId,
    pub resume_url: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub feedback: Vec<FeedbackEntry>,
    pub ranking: DerivedRanking,
    pub referred_by: Option<UserId>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl ApplicationRecord {
    pub fn ratings(&self) -> Vec<u8> {
        self.feedback.iter().map(|entry| entry.rating).collect()
    }
}

/// Job seeker payload for a new application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub job_id: JobId,
    pub resume_url: String,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub referred_by: Option<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

/// Recruiter payload for appending feedback; the rating is validated before storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub rating: i64,
    pub comment: String,
    pub stage: String,
}
