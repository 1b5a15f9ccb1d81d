use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, DerivedRanking,
    FeedbackEntry, FeedbackSubmission,
};
use super::ranking::{
    persist_rankings, Candidate, PersistenceSummary, RankingEngine, ScoreBreakdown,
};
use super::repository::ApplicationRepository;
use crate::config::RankingSettings;
use crate::recruiting::access::{AccessPolicy, Action, Actor, OwnershipPolicy, Resource, UserId};
use crate::recruiting::error::RecruitingError;
use crate::recruiting::events::{emit, DomainEvent, EventOutbox};
use crate::recruiting::jobs::{JobId, JobPosting, JobRepository};
use crate::recruiting::profiles::{ApplicantSnapshot, ProfileDirectory};
use crate::recruiting::repository::RepositoryError;

/// Service composing storage, access rules, the ranking engine, and the outbox.
pub struct ApplicationService<R, O> {
    applications: Arc<R>,
    outbox: Arc<O>,
    jobs: Arc<dyn JobRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    policy: Arc<dyn AccessPolicy>,
    settings: RankingSettings,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> (ApplicationId, u64) {
    let sequence = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    (ApplicationId(format!("app-{sequence:06}")), sequence)
}

/// Applicant fields exposed to the recruiter alongside a ranked application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantView {
    pub id: UserId,
    pub skills: Vec<String>,
    pub experience: f64,
}

/// Application record annotated with the freshly computed score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedApplication {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: ApplicantView,
    pub status: ApplicationStatus,
    pub feedback: Vec<FeedbackEntry>,
    pub ranking: i64,
    pub score_breakdown: ScoreBreakdown,
}

/// Result of one ranking pass, best-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingOutcome {
    pub job_id: JobId,
    pub applications: Vec<RankedApplication>,
    pub persistence: PersistenceSummary,
}

impl<R, O> ApplicationService<R, O>
where
    R: ApplicationRepository + 'static,
    O: EventOutbox + 'static,
{
    pub fn new(
        applications: Arc<R>,
        outbox: Arc<O>,
        jobs: Arc<dyn JobRepository>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            applications,
            outbox,
            jobs,
            profiles,
            policy: Arc::new(OwnershipPolicy),
            settings: RankingSettings::default(),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_ranking_settings(mut self, settings: RankingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Apply to an open posting. One application per (job, applicant).
    pub fn submit(
        &self,
        actor: &Actor,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, RecruitingError> {
        let job = self.job(&submission.job_id)?;
        self.policy
            .authorize(actor, &Resource::Job(&job), Action::ApplyTo)?;

        if submission.resume_url.trim().is_empty() {
            return Err(RecruitingError::Validation(
                "please upload a resume".to_string(),
            ));
        }

        let now = Utc::now();
        if let Some(reason) = job.closed_reason(now) {
            return Err(RecruitingError::Validation(reason.to_string()));
        }

        let already_applied = self
            .applications
            .for_job(&job.id)?
            .iter()
            .any(|record| record.applicant == actor.user_id);
        if already_applied {
            return Err(RecruitingError::Duplicate(
                "you have already applied for this job".to_string(),
            ));
        }

        let (id, sequence) = next_application_id();
        let record = ApplicationRecord {
            id,
            job: job.id.clone(),
            applicant: actor.user_id.clone(),
            recruiter: job.recruiter.clone(),
            resume_url: submission.resume_url,
            cover_letter: submission.cover_letter,
            status: ApplicationStatus::Applied,
            feedback: Vec::new(),
            ranking: DerivedRanking::default(),
            referred_by: submission.referred_by,
            submitted_at: now,
            updated_at: now,
            sequence,
        };

        let stored = match self.applications.insert(record) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(RecruitingError::Duplicate(
                    "you have already applied for this job".to_string(),
                ))
            }
            Err(other) => return Err(other.into()),
        };

        if let Err(err) = self.jobs.record_application(&job.id) {
            warn!(job_id = %job.id.0, error = %err, "failed to bump application count");
        }

        info!(application_id = %stored.id.0, job_id = %job.id.0, "application submitted");
        emit(
            self.outbox.as_ref(),
            DomainEvent::ApplicationSubmitted {
                application_id: stored.id.clone(),
                job_id: job.id.clone(),
                job_title: job.title.clone(),
                applicant: stored.applicant.clone(),
                recruiter: stored.recruiter.clone(),
            },
        );

        Ok(stored)
    }

    /// Visible to the applicant and to the posting's recruiter only.
    pub fn get(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, RecruitingError> {
        let record = self.application(id)?;
        self.policy
            .authorize(actor, &Resource::Application(&record), Action::ReadApplication)?;
        Ok(record)
    }

    pub fn update_status(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, RecruitingError> {
        let current = self.application(id)?;
        self.policy
            .authorize(actor, &Resource::Application(&current), Action::UpdateStatus)?;

        let record = self.applications.set_status(id, status, Utc::now())?;

        let (job_title, company) = match self.jobs.fetch(&record.job) {
            Ok(Some(job)) => (job.title, job.company),
            Ok(None) => (record.job.0.clone(), String::new()),
            Err(err) => {
                warn!(job_id = %record.job.0, error = %err, "job lookup failed for notification");
                (record.job.0.clone(), String::new())
            }
        };

        info!(application_id = %record.id.0, status = status.label(), "application status updated");
        emit(
            self.outbox.as_ref(),
            DomainEvent::ApplicationStatusChanged {
                application_id: record.id.clone(),
                job_id: record.job.clone(),
                job_title,
                company,
                applicant: record.applicant.clone(),
                status,
            },
        );

        Ok(record)
    }

    /// Append a rated comment. Existing entries are never touched.
    pub fn add_feedback(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        submission: FeedbackSubmission,
    ) -> Result<ApplicationRecord, RecruitingError> {
        let current = self.application(id)?;
        self.policy
            .authorize(actor, &Resource::Application(&current), Action::AddFeedback)?;

        let rating = u8::try_from(submission.rating)
            .ok()
            .filter(|rating| (1..=5).contains(rating))
            .ok_or_else(|| {
                RecruitingError::Validation("rating must be between 1 and 5".to_string())
            })?;
        if submission.comment.trim().is_empty() {
            return Err(RecruitingError::Validation(
                "feedback comment is required".to_string(),
            ));
        }
        if submission.stage.trim().is_empty() {
            return Err(RecruitingError::Validation(
                "feedback stage is required".to_string(),
            ));
        }

        let entry = FeedbackEntry {
            rating,
            comment: submission.comment,
            stage: submission.stage.clone(),
            created_at: Utc::now(),
        };
        let record = self.applications.append_feedback(id, entry)?;

        emit(
            self.outbox.as_ref(),
            DomainEvent::FeedbackAdded {
                application_id: record.id.clone(),
                stage: submission.stage,
                rating,
            },
        );

        Ok(record)
    }

    /// All applications for a posting, newest first. Owning recruiter only.
    pub fn for_job(
        &self,
        actor: &Actor,
        job_id: &JobId,
    ) -> Result<Vec<ApplicationRecord>, RecruitingError> {
        let job = self.job(job_id)?;
        self.policy
            .authorize(actor, &Resource::Job(&job), Action::ListForJob)?;
        let mut records = self.applications.for_job(job_id)?;
        newest_first(&mut records);
        Ok(records)
    }

    pub fn mine(&self, actor: &Actor) -> Result<Vec<ApplicationRecord>, RecruitingError> {
        self.policy
            .authorize(actor, &Resource::JobBoard, Action::ListOwnApplications)?;
        let mut records = self.applications.for_applicant(&actor.user_id)?;
        newest_first(&mut records);
        Ok(records)
    }

    pub fn for_recruiter(&self, actor: &Actor) -> Result<Vec<ApplicationRecord>, RecruitingError> {
        self.policy
            .authorize(actor, &Resource::JobBoard, Action::ListRecruiterApplications)?;
        let mut records = self.applications.for_recruiter(&actor.user_id)?;
        newest_first(&mut records);
        Ok(records)
    }

    /// Recompute every application's score for a posting, persist the scores,
    /// and return the applications best-first.
    ///
    /// Lookup and authorization failures abort before anything is scored.
    /// Individual write failures are logged and counted; the pass only fails
    /// when every write failed.
    pub async fn rank(
        &self,
        actor: &Actor,
        job_id: &JobId,
    ) -> Result<RankingOutcome, RecruitingError> {
        let job = self.job(job_id)?;
        self.policy
            .authorize(actor, &Resource::Job(&job), Action::RankForJob)?;

        let mut records = self.applications.for_job(job_id)?;
        newest_first(&mut records);

        let candidates: Vec<Candidate<ApplicationRecord>> = records
            .into_iter()
            .map(|record| Candidate {
                applicant: self.applicant_snapshot(&record.applicant),
                ratings: record.ratings(),
                item: record,
            })
            .collect();

        let engine = RankingEngine::new(job.requirements());
        let computed_at = Utc::now();
        let ranked = engine.rank(candidates, computed_at);

        let writes = ranked
            .iter()
            .map(|entry| {
                (
                    entry.item.id.clone(),
                    DerivedRanking {
                        score: entry.breakdown.total,
                        computed_at: Some(computed_at),
                    },
                )
            })
            .collect();
        let persistence =
            persist_rankings(self.applications.clone(), writes, self.settings.write_attempts)
                .await;

        if persistence.all_failed() {
            return Err(RecruitingError::Repository(RepositoryError::Unavailable(
                format!("no ranking writes succeeded for {}", job.id.0),
            )));
        }
        if !persistence.is_complete() {
            warn!(
                job_id = %job.id.0,
                failed = persistence.failed,
                attempted = persistence.attempted,
                "ranking pass persisted partially; next pass will reconcile"
            );
        }

        info!(job_id = %job.id.0, ranked = ranked.len(), "applications ranked");
        emit(
            self.outbox.as_ref(),
            DomainEvent::ApplicationsRanked {
                job_id: job.id.clone(),
                recruiter: actor.user_id.clone(),
                ranked: ranked.len(),
                failed_writes: persistence.failed,
            },
        );

        let applications = ranked
            .into_iter()
            .map(|entry| {
                let record = entry.item;
                RankedApplication {
                    id: record.id,
                    job: record.job,
                    applicant: ApplicantView {
                        id: record.applicant,
                        skills: entry.applicant.skills,
                        experience: entry.applicant.experience,
                    },
                    status: record.status,
                    feedback: record.feedback,
                    ranking: entry.breakdown.total,
                    score_breakdown: entry.breakdown,
                }
            })
            .collect();

        Ok(RankingOutcome {
            job_id: job.id,
            applications,
            persistence,
        })
    }

    fn job(&self, id: &JobId) -> Result<JobPosting, RecruitingError> {
        self.jobs.fetch(id)?.ok_or(RecruitingError::NotFound("job"))
    }

    fn application(&self, id: &ApplicationId) -> Result<ApplicationRecord, RecruitingError> {
        self.applications
            .fetch(id)?
            .ok_or(RecruitingError::NotFound("application"))
    }

    /// A missing or unreadable profile scores as an empty one.
    fn applicant_snapshot(&self, applicant: &UserId) -> ApplicantSnapshot {
        match self.profiles.fetch(applicant) {
            Ok(Some(profile)) => profile.snapshot(),
            Ok(None) => {
                debug!(applicant = %applicant.0, "no profile on file; scoring as empty");
                ApplicantSnapshot::default()
            }
            Err(err) => {
                warn!(applicant = %applicant.0, error = %err, "profile lookup failed; scoring as empty");
                ApplicantSnapshot::default()
            }
        }
    }
}

fn newest_first(records: &mut [ApplicationRecord]) {
    records.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then(b.sequence.cmp(&a.sequence))
    });
}
