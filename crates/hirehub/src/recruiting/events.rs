use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::access::UserId;
use super::applications::{ApplicationId, ApplicationStatus};
use super::jobs::JobId;
use super::profiles::ProfileDirectory;
use super::repository::RepositoryError;

/// State transitions worth telling someone about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    ApplicationSubmitted {
        application_id: ApplicationId,
        job_id: JobId,
        job_title: String,
        applicant: UserId,
        recruiter: UserId,
    },
    ApplicationStatusChanged {
        application_id: ApplicationId,
        job_id: JobId,
        job_title: String,
        company: String,
        applicant: UserId,
        status: ApplicationStatus,
    },
    FeedbackAdded {
        application_id: ApplicationId,
        stage: String,
        rating: u8,
    },
    ApplicationsRanked {
        job_id: JobId,
        recruiter: UserId,
        ranked: usize,
        failed_writes: usize,
    },
}

impl DomainEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            DomainEvent::ApplicationSubmitted { .. } => "application_submitted",
            DomainEvent::ApplicationStatusChanged { .. } => "application_status_changed",
            DomainEvent::FeedbackAdded { .. } => "feedback_added",
            DomainEvent::ApplicationsRanked { .. } => "applications_ranked",
        }
    }
}

/// Event stored in the outbox together with its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: u64,
    pub event: DomainEvent,
    pub recorded_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Durable queue of domain events awaiting notification.
///
/// `pending` must not return acknowledged or dead-lettered entries.
pub trait EventOutbox: Send + Sync {
    fn record(&self, event: DomainEvent) -> Result<u64, RepositoryError>;
    fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, RepositoryError>;
    fn acknowledge(&self, id: u64) -> Result<(), RepositoryError>;
    fn mark_failed(&self, id: u64, error: &str) -> Result<(), RepositoryError>;
    fn dead_letter(&self, id: u64) -> Result<(), RepositoryError>;
}

/// Record an event without letting outbox trouble fail the caller's operation.
pub(crate) fn emit<O: EventOutbox + ?Sized>(outbox: &O, event: DomainEvent) {
    let name = event.name();
    match outbox.record(event) {
        Ok(id) => debug!(event = name, outbox_id = id, "domain event recorded"),
        Err(err) => warn!(event = name, error = %err, "failed to record domain event"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub trait MailTransport: Send + Sync {
    fn send(&self, message: EmailMessage) -> Result<(), NotifyError>;
}

/// Counts from a single outbox drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub delivered: usize,
    pub skipped: usize,
    pub retrying: usize,
    pub dead_lettered: usize,
}

/// Turns outbox entries into e-mail, one attempt per entry per drain.
pub struct Notifier<O: ?Sized, M: ?Sized, P: ?Sized> {
    outbox: Arc<O>,
    transport: Arc<M>,
    directory: Arc<P>,
    max_attempts: u32,
}

impl<O, M, P> Notifier<O, M, P>
where
    O: EventOutbox + ?Sized,
    M: MailTransport + ?Sized,
    P: ProfileDirectory + ?Sized,
{
    pub fn new(
        outbox: Arc<O>,
        transport: Arc<M>,
        directory: Arc<P>,
        max_attempts: u32,
    ) -> Self {
        Self {
            outbox,
            transport,
            directory,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn drain(&self, limit: usize) -> Result<DrainReport, NotifyError> {
        let mut report = DrainReport::default();

        for entry in self.outbox.pending(limit)? {
            let message = match self.compose(&entry.event) {
                Ok(Some(message)) => message,
                Ok(None) => {
                    self.outbox.acknowledge(entry.id)?;
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    self.fail(&entry, &err.to_string(), &mut report)?;
                    continue;
                }
            };

            match self.transport.send(message) {
                Ok(()) => {
                    self.outbox.acknowledge(entry.id)?;
                    report.delivered += 1;
                }
                Err(err) => self.fail(&entry, &err.to_string(), &mut report)?,
            }
        }

        Ok(report)
    }

    fn fail(
        &self,
        entry: &OutboxEntry,
        error: &str,
        report: &mut DrainReport,
    ) -> Result<(), NotifyError> {
        let attempts = entry.attempts + 1;
        warn!(
            event = entry.event.name(),
            outbox_id = entry.id,
            attempts,
            error,
            "notification delivery failed"
        );
        if attempts >= self.max_attempts {
            self.outbox.dead_letter(entry.id)?;
            report.dead_lettered += 1;
        } else {
            self.outbox.mark_failed(entry.id, error)?;
            report.retrying += 1;
        }
        Ok(())
    }

    fn compose(&self, event: &DomainEvent) -> Result<Option<EmailMessage>, RepositoryError> {
        match event {
            DomainEvent::ApplicationSubmitted {
                job_title,
                applicant,
                recruiter,
                ..
            } => {
                let Some(recruiter) = self.directory.fetch(recruiter)? else {
                    return Ok(None);
                };
                let applicant_name = self
                    .directory
                    .fetch(applicant)?
                    .map(|profile| profile.name)
                    .unwrap_or_else(|| applicant.0.clone());
                let subject = format!("New Application for {job_title}");
                let job_title = escape_html(job_title);
                let applicant_name = escape_html(&applicant_name);
                Ok(Some(EmailMessage {
                    to: recruiter.email,
                    subject,
                    html: format!(
                        "<h1>New Application Received</h1>\
                         <p>A new application has been submitted for the position of {job_title}.</p>\
                         <p>Applicant: {applicant_name}</p>\
                         <p>Please login to your dashboard to review the application.</p>"
                    ),
                }))
            }
            DomainEvent::ApplicationStatusChanged {
                job_title,
                company,
                applicant,
                status,
                ..
            } => {
                let Some(applicant) = self.directory.fetch(applicant)? else {
                    return Ok(None);
                };
                let subject = format!("Application Status Update for {job_title}");
                let job_title = escape_html(job_title);
                let company = escape_html(company);
                Ok(Some(EmailMessage {
                    to: applicant.email,
                    subject,
                    html: format!(
                        "<h1>Application Status Update</h1>\
                         <p>Your application for the position of {job_title} at {company} has been updated.</p>\
                         <p>New Status: <strong>{}</strong></p>\
                         <p>Please login to your dashboard for more details.</p>",
                        status.label()
                    ),
                }))
            }
            DomainEvent::FeedbackAdded { .. } | DomainEvent::ApplicationsRanked { .. } => Ok(None),
        }
    }
}

/// User-supplied text placed into an HTML body.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
