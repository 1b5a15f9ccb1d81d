use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{JobDraft, JobId, JobPage, JobPosting, JobQuery, JobStatus};
use super::repository::JobRepository;
use crate::recruiting::access::{AccessPolicy, Action, Actor, Resource};
use crate::recruiting::error::RecruitingError;
use crate::recruiting::profiles::ProfileDirectory;

pub const JOBS_PAGE_SIZE: usize = 10;

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> (JobId, u64) {
    let sequence = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    (JobId(format!("job-{sequence:06}")), sequence)
}

/// Service wrapping the posting repository with the board's access rules.
pub struct JobService<J> {
    jobs: Arc<J>,
    profiles: Arc<dyn ProfileDirectory>,
    policy: Arc<dyn AccessPolicy>,
}

impl<J> JobService<J>
where
    J: JobRepository + 'static,
{
    pub fn new(
        jobs: Arc<J>,
        profiles: Arc<dyn ProfileDirectory>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            jobs,
            profiles,
            policy,
        }
    }

    /// Publish a posting owned by the calling recruiter.
    pub fn create(&self, actor: &Actor, draft: JobDraft) -> Result<JobPosting, RecruitingError> {
        self.policy
            .authorize(actor, &Resource::JobBoard, Action::CreateJob)?;
        validate_draft(&draft)?;

        let company = self
            .profiles
            .fetch(&actor.user_id)?
            .and_then(|profile| profile.company)
            .unwrap_or_default();

        let (id, sequence) = next_job_id();
        let job = JobPosting {
            id,
            recruiter: actor.user_id.clone(),
            company,
            title: draft.title.trim().to_string(),
            description: draft.description,
            requirements: draft.requirements,
            location: draft.location,
            employment_type: draft.employment_type,
            salary: draft.salary,
            skills: draft.skills,
            experience: draft.experience,
            deadline: draft.deadline,
            status: draft.status,
            applications_count: 0,
            created_at: Utc::now(),
            sequence,
        };

        let stored = self.jobs.insert(job)?;
        info!(job_id = %stored.id.0, recruiter = %stored.recruiter.0, "job posted");
        Ok(stored)
    }

    /// Public lookup; postings are visible to everyone.
    pub fn get(&self, id: &JobId) -> Result<JobPosting, RecruitingError> {
        self.jobs.fetch(id)?.ok_or(RecruitingError::NotFound("job"))
    }

    /// Open postings matching the query, newest first, ten per page.
    pub fn search(&self, query: &JobQuery) -> Result<JobPage, RecruitingError> {
        let keyword = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty());
        let location = query
            .location
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty());

        let mut matches: Vec<JobPosting> = self
            .jobs
            .all()?
            .into_iter()
            .filter(|job| job.status == JobStatus::Open)
            .filter(|job| keyword.map_or(true, |k| job.matches_keyword(k)))
            .filter(|job| {
                location
                    .as_deref()
                    .map_or(true, |l| job.location.to_lowercase().contains(l))
            })
            .collect();
        newest_first(&mut matches);

        let total = matches.len();
        let page = query.page.unwrap_or(1).max(1);
        let pages = total.div_ceil(JOBS_PAGE_SIZE);
        let jobs = matches
            .into_iter()
            .skip((page - 1).saturating_mul(JOBS_PAGE_SIZE))
            .take(JOBS_PAGE_SIZE)
            .collect();

        Ok(JobPage {
            jobs,
            page,
            pages,
            total,
        })
    }

    /// Every posting owned by the calling recruiter, newest first.
    pub fn mine(&self, actor: &Actor) -> Result<Vec<JobPosting>, RecruitingError> {
        self.policy
            .authorize(actor, &Resource::JobBoard, Action::ListOwnJobs)?;
        let mut jobs: Vec<JobPosting> = self
            .jobs
            .all()?
            .into_iter()
            .filter(|job| job.recruiter == actor.user_id)
            .collect();
        newest_first(&mut jobs);
        Ok(jobs)
    }
}

fn newest_first(jobs: &mut [JobPosting]) {
    jobs.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.sequence.cmp(&a.sequence))
    });
}

fn validate_draft(draft: &JobDraft) -> Result<(), RecruitingError> {
    if draft.title.trim().is_empty() {
        return Err(RecruitingError::Validation(
            "please add a job title".to_string(),
        ));
    }
    if draft.description.trim().is_empty() {
        return Err(RecruitingError::Validation(
            "please add a job description".to_string(),
        ));
    }
    if draft.location.trim().is_empty() {
        return Err(RecruitingError::Validation(
            "please add a job location".to_string(),
        ));
    }
    let experience = draft.experience;
    if !experience.min.is_finite() || experience.min < 0.0 {
        return Err(RecruitingError::Validation(
            "minimum experience must be a non-negative number of years".to_string(),
        ));
    }
    if !experience.max.is_finite() || experience.max < 0.0 {
        return Err(RecruitingError::Validation(
            "maximum experience must be a non-negative number of years".to_string(),
        ));
    }
    Ok(())
}
