use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::config::RankingSettings;
use crate::recruiting::access::{Actor, OwnershipPolicy, Role, UserId};
use crate::recruiting::applications::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, DerivedRanking,
    FeedbackEntry,
};
use crate::recruiting::applications::repository::ApplicationRepository;
use crate::recruiting::applications::ApplicationService;
use crate::recruiting::events::{
    DomainEvent, EmailMessage, EventOutbox, MailTransport, NotifyError, OutboxEntry,
};
use crate::recruiting::jobs::{
    EmploymentType, ExperienceRange, JobDraft, JobId, JobPosting, JobRepository, JobService,
    JobStatus, SalaryRange,
};
use crate::recruiting::profiles::{ProfileDirectory, UserProfile};
use crate::recruiting::repository::RepositoryError;

pub(super) const RECRUITER: &str = "rec-1";
pub(super) const OTHER_RECRUITER: &str = "rec-2";

pub(super) fn recruiter() -> Actor {
    Actor::recruiter(RECRUITER)
}

pub(super) fn other_recruiter() -> Actor {
    Actor::recruiter(OTHER_RECRUITER)
}

pub(super) fn seeker(id: &str) -> Actor {
    Actor::job_seeker(id)
}

pub(super) fn job_draft(skills: &[&str], min_experience: f64) -> JobDraft {
    JobDraft {
        title: "Frontend Engineer".to_string(),
        description: "Build the candidate dashboard".to_string(),
        requirements: vec!["Portfolio".to_string()],
        location: "Remote".to_string(),
        employment_type: EmploymentType::FullTime,
        salary: SalaryRange::default(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        experience: ExperienceRange {
            min: min_experience,
            max: 0.0,
        },
        deadline: Utc::now() + Duration::days(30),
        status: JobStatus::Open,
    }
}

pub(super) fn submission(job_id: &JobId) -> ApplicationSubmission {
    ApplicationSubmission {
        job_id: job_id.clone(),
        resume_url: "https://cdn.example.com/resume.pdf".to_string(),
        cover_letter: String::new(),
        referred_by: None,
    }
}

pub(super) fn seeker_profile(id: &str, skills: &[&str], experience: f64) -> UserProfile {
    UserProfile {
        user_id: UserId(id.to_string()),
        name: format!("Seeker {id}"),
        email: format!("{id}@example.com"),
        role: Role::JobSeeker,
        company: None,
        skills: Some(skills.iter().map(|s| s.to_string()).collect()),
        experience: Some(experience),
    }
}

pub(super) fn recruiter_profile(id: &str) -> UserProfile {
    UserProfile {
        user_id: UserId(id.to_string()),
        name: format!("Recruiter {id}"),
        email: format!("{id}@hirehub.test"),
        role: Role::Recruiter,
        company: Some("Acme".to_string()),
        skills: None,
        experience: None,
    }
}

pub(super) type TestService = ApplicationService<MemoryApplications, MemoryOutbox>;

pub(super) struct Fixture {
    pub(super) applications: Arc<TestService>,
    pub(super) jobs: Arc<JobService<MemoryJobs>>,
    pub(super) application_store: Arc<MemoryApplications>,
    pub(super) job_store: Arc<MemoryJobs>,
    pub(super) profiles: Arc<MemoryProfiles>,
    pub(super) outbox: Arc<MemoryOutbox>,
}

impl Fixture {
    pub(super) fn new() -> Self {
        let application_store = Arc::new(MemoryApplications::default());
        let job_store = Arc::new(MemoryJobs::default());
        let profiles = Arc::new(MemoryProfiles::default());
        let outbox = Arc::new(MemoryOutbox::default());

        profiles.put(recruiter_profile(RECRUITER));
        profiles.put(recruiter_profile(OTHER_RECRUITER));

        let applications = ApplicationService::new(
            application_store.clone(),
            outbox.clone(),
            job_store.clone(),
            profiles.clone(),
        )
        .with_ranking_settings(RankingSettings { write_attempts: 3 });
        let jobs = JobService::new(job_store.clone(), profiles.clone(), Arc::new(OwnershipPolicy));

        Self {
            applications: Arc::new(applications),
            jobs: Arc::new(jobs),
            application_store,
            job_store,
            profiles,
            outbox,
        }
    }

    pub(super) fn post_job(&self, skills: &[&str], min_experience: f64) -> JobPosting {
        self.jobs
            .create(&recruiter(), job_draft(skills, min_experience))
            .expect("recruiter can post")
    }

    pub(super) fn apply(&self, job: &JobPosting, applicant: &str) -> ApplicationRecord {
        self.applications
            .submit(&seeker(applicant), submission(&job.id))
            .expect("seeker can apply")
    }
}

#[derive(Default)]
pub(super) struct MemoryApplications {
    records: Mutex<HashMap<ApplicationId, ApplicationRecord>>,
    ranking_failures: Mutex<HashMap<ApplicationId, u32>>,
    ranking_calls: Mutex<HashMap<ApplicationId, u32>>,
}

impl MemoryApplications {
    /// Make the next `times` ranking writes for `id` fail as unavailable.
    pub(super) fn fail_ranking_writes(&self, id: &ApplicationId, times: u32) {
        self.ranking_failures
            .lock()
            .expect("failure mutex poisoned")
            .insert(id.clone(), times);
    }

    pub(super) fn ranking_calls(&self, id: &ApplicationId) -> u32 {
        self.ranking_calls
            .lock()
            .expect("calls mutex poisoned")
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub(super) fn stored(&self, id: &ApplicationId) -> ApplicationRecord {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("record present")
    }

    fn filtered(&self, keep: impl Fn(&ApplicationRecord) -> bool) -> Vec<ApplicationRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .values()
            .filter(|record| keep(record))
            .cloned()
            .collect()
    }
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let duplicate = guard
            .values()
            .any(|existing| existing.job == record.job && existing.applicant == record.applicant);
        if duplicate || guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn append_feedback(
        &self,
        id: &ApplicationId,
        entry: FeedbackEntry,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.updated_at = entry.created_at;
        record.feedback.push(entry);
        Ok(record.clone())
    }

    fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.status = status;
        record.updated_at = updated_at;
        Ok(record.clone())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self.filtered(|record| &record.job == job))
    }

    fn for_applicant(&self, applicant: &UserId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self.filtered(|record| &record.applicant == applicant))
    }

    fn for_recruiter(&self, recruiter: &UserId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self.filtered(|record| &record.recruiter == recruiter))
    }

    fn store_ranking(
        &self,
        id: &ApplicationId,
        ranking: DerivedRanking,
    ) -> Result<(), RepositoryError> {
        *self
            .ranking_calls
            .lock()
            .expect("calls mutex poisoned")
            .entry(id.clone())
            .or_default() += 1;

        {
            let mut failures = self.ranking_failures.lock().expect("failure mutex poisoned");
            if let Some(remaining) = failures.get_mut(id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(RepositoryError::Unavailable("write timed out".to_string()));
                }
            }
        }

        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.ranking = ranking;
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryJobs {
    jobs: Mutex<HashMap<JobId, JobPosting>>,
}

impl MemoryJobs {
    pub(super) fn stored(&self, id: &JobId) -> JobPosting {
        self.jobs
            .lock()
            .expect("job mutex poisoned")
            .get(id)
            .cloned()
            .expect("job present")
    }

    pub(super) fn replace(&self, job: JobPosting) {
        self.jobs
            .lock()
            .expect("job mutex poisoned")
            .insert(job.id.clone(), job);
    }
}

impl JobRepository for MemoryJobs {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn record_application(&self, id: &JobId) -> Result<u32, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        let job = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.applications_count += 1;
        Ok(job.applications_count)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(self.jobs.lock().expect("job mutex poisoned").get(id).cloned())
    }

    fn all(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self
            .jobs
            .lock()
            .expect("job mutex poisoned")
            .values()
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

impl MemoryProfiles {
    pub(super) fn put(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.user_id.clone(), profile);
    }
}

impl ProfileDirectory for MemoryProfiles {
    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(id)
            .cloned())
    }

    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
        self.put(profile.clone());
        Ok(profile)
    }
}

#[derive(Default)]
pub(super) struct MemoryOutbox {
    entries: Mutex<Vec<OutboxEntry>>,
    closed: Mutex<Vec<(u64, bool)>>,
}

impl MemoryOutbox {
    pub(super) fn events(&self) -> Vec<DomainEvent> {
        self.entries
            .lock()
            .expect("outbox mutex poisoned")
            .iter()
            .map(|entry| entry.event.clone())
            .collect()
    }

    pub(super) fn acknowledged(&self) -> Vec<u64> {
        self.closed_with(true)
    }

    pub(super) fn dead_lettered(&self) -> Vec<u64> {
        self.closed_with(false)
    }

    fn closed_with(&self, delivered: bool) -> Vec<u64> {
        self.closed
            .lock()
            .expect("outbox mutex poisoned")
            .iter()
            .filter(|(_, ack)| *ack == delivered)
            .map(|(id, _)| *id)
            .collect()
    }

    fn close(&self, id: u64, delivered: bool) -> Result<(), RepositoryError> {
        let mut closed = self.closed.lock().expect("outbox mutex poisoned");
        if closed.iter().any(|(existing, _)| *existing == id) {
            return Err(RepositoryError::NotFound);
        }
        closed.push((id, delivered));
        Ok(())
    }
}

impl EventOutbox for MemoryOutbox {
    fn record(&self, event: DomainEvent) -> Result<u64, RepositoryError> {
        let mut entries = self.entries.lock().expect("outbox mutex poisoned");
        let id = entries.len() as u64 + 1;
        entries.push(OutboxEntry {
            id,
            event,
            recorded_at: Utc::now(),
            attempts: 0,
            last_error: None,
        });
        Ok(id)
    }

    fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError> {
        let closed = self.closed.lock().expect("outbox mutex poisoned");
        Ok(self
            .entries
            .lock()
            .expect("outbox mutex poisoned")
            .iter()
            .filter(|entry| !closed.iter().any(|(id, _)| *id == entry.id))
            .take(limit)
            .cloned()
            .collect())
    }

    fn acknowledge(&self, id: u64) -> Result<(), RepositoryError> {
        self.close(id, true)
    }

    fn mark_failed(&self, id: u64, error: &str) -> Result<(), RepositoryError> {
        let mut entries = self.entries.lock().expect("outbox mutex poisoned");
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(RepositoryError::NotFound)?;
        entry.attempts += 1;
        entry.last_error = Some(error.to_string());
        Ok(())
    }

    fn dead_letter(&self, id: u64) -> Result<(), RepositoryError> {
        self.close(id, false)
    }
}

/// Mail transport that fails a fixed number of times before delivering.
#[derive(Default)]
pub(super) struct FlakyTransport {
    failures_left: Mutex<u32>,
    sent: Mutex<Vec<EmailMessage>>,
}

impl FlakyTransport {
    pub(super) fn failing(times: u32) -> Self {
        Self {
            failures_left: Mutex::new(times),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

impl MailTransport for FlakyTransport {
    fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        let mut failures = self.failures_left.lock().expect("transport mutex poisoned");
        if *failures > 0 {
            *failures -= 1;
            return Err(NotifyError::Transport("smtp relay refused".to_string()));
        }
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(message);
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
