use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recruiting::access::UserId;
use crate::recruiting::applications::ranking::JobRequirements;

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for SalaryRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: 0,
            currency: default_currency(),
        }
    }
}

/// Years of experience a posting asks for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min: f64,
    #[serde(default)]
    pub max: f64,
}

/// A published (or drafted) job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub recruiter: UserId,
    pub company: String,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub employment_type: EmploymentType,
    pub salary: SalaryRange,
    pub skills: Vec<String>,
    pub experience: ExperienceRange,
    pub deadline: DateTime<Utc>,
    pub status: JobStatus,
    pub applications_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl JobPosting {
    /// What the ranking pass compares applicants against.
    pub fn requirements(&self) -> JobRequirements {
        JobRequirements::new(self.skills.clone(), self.experience.min)
    }

    /// Reason the posting cannot take new applications, if any.
    pub fn closed_reason(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if self.status != JobStatus::Open {
            Some("job is not open for applications")
        } else if self.deadline < now {
            Some("application deadline has passed")
        } else {
            None
        }
    }

    pub(crate) fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(&needle))
    }
}

/// Recruiter-supplied fields for a new posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub location: String,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub salary: SalaryRange,
    pub skills: Vec<String>,
    pub experience: ExperienceRange,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub status: JobStatus,
}

/// Public search over open postings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobQuery {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPage {
    pub jobs: Vec<JobPosting>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}
