use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use hirehub::recruiting::applications::{
    ApplicationId, ApplicationRecord, ApplicationRepository, ApplicationStatus, DerivedRanking,
    FeedbackEntry,
};
use hirehub::recruiting::events::{EmailMessage, MailTransport, NotifyError, OutboxEntry};
use hirehub::recruiting::jobs::{JobId, JobPosting, JobRepository};
use hirehub::recruiting::profiles::{ProfileDirectory, UserProfile};
use hirehub::recruiting::{DomainEvent, EventOutbox, RepositoryError, UserId};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    jobs: Arc<Mutex<HashMap<JobId, JobPosting>>>,
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = lock(&self.jobs)?;
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn record_application(&self, id: &JobId) -> Result<u32, RepositoryError> {
        let mut guard = lock(&self.jobs)?;
        let job = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.applications_count = job.applications_count.saturating_add(1);
        Ok(job.applications_count)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(lock(&self.jobs)?.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(lock(&self.jobs)?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    fn matching(
        &self,
        keep: impl Fn(&ApplicationRecord) -> bool,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| keep(record))
            .cloned()
            .collect())
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let taken = guard.contains_key(&record.id)
            || guard
                .values()
                .any(|existing| existing.job == record.job && existing.applicant == record.applicant);
        if taken {
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
        let mut guard = lock(&self.records)?;
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
        let mut guard = lock(&self.records)?;
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.status = status;
        record.updated_at = updated_at;
        Ok(record.clone())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn for_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.matching(|record| &record.job == job)
    }

    fn for_applicant(&self, applicant: &UserId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.matching(|record| &record.applicant == applicant)
    }

    fn for_recruiter(&self, recruiter: &UserId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.matching(|record| &record.recruiter == recruiter)
    }

    fn store_ranking(
        &self,
        id: &ApplicationId,
        ranking: DerivedRanking,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.ranking = ranking;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileDirectory {
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl ProfileDirectory for InMemoryProfileDirectory {
    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(lock(&self.profiles)?.get(id).cloned())
    }

    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
        lock(&self.profiles)?.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Pending,
    Delivered,
    DeadLettered,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOutbox {
    entries: Arc<Mutex<Vec<(OutboxEntry, EntryState)>>>,
}

impl InMemoryOutbox {
    fn transition(&self, id: u64, state: EntryState) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.entries)?;
        let (_, current) = guard
            .iter_mut()
            .find(|(entry, _)| entry.id == id)
            .ok_or(RepositoryError::NotFound)?;
        *current = state;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.entries
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|(_, state)| *state == EntryState::Pending)
                    .count()
            })
            .unwrap_or_default()
    }
}

impl EventOutbox for InMemoryOutbox {
    fn record(&self, event: DomainEvent) -> Result<u64, RepositoryError> {
        let mut guard = lock(&self.entries)?;
        let id = guard.len() as u64 + 1;
        guard.push((
            OutboxEntry {
                id,
                event,
                recorded_at: Utc::now(),
                attempts: 0,
                last_error: None,
            },
            EntryState::Pending,
        ));
        Ok(id)
    }

    fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError> {
        Ok(lock(&self.entries)?
            .iter()
            .filter(|(_, state)| *state == EntryState::Pending)
            .take(limit)
            .map(|(entry, _)| entry.clone())
            .collect())
    }

    fn acknowledge(&self, id: u64) -> Result<(), RepositoryError> {
        self.transition(id, EntryState::Delivered)
    }

    fn mark_failed(&self, id: u64, error: &str) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.entries)?;
        let (entry, _) = guard
            .iter_mut()
            .find(|(entry, _)| entry.id == id)
            .ok_or(RepositoryError::NotFound)?;
        entry.attempts += 1;
        entry.last_error = Some(error.to_string());
        Ok(())
    }

    fn dead_letter(&self, id: u64) -> Result<(), RepositoryError> {
        self.transition(id, EntryState::DeadLettered)
    }
}

/// Stands in for SMTP in local runs: every message goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogMailTransport;

impl MailTransport for LogMailTransport {
    fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        info!(to = %message.to, subject = %message.subject, "email dispatched");
        Ok(())
    }
}
