use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, DerivedRanking, FeedbackEntry,
};
use crate::recruiting::access::UserId;
use crate::recruiting::jobs::JobId;
use crate::recruiting::repository::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `insert` must reject a second record for the same (job, applicant) pair with
/// [`RepositoryError::Conflict`]. Mutations touch only their own fields and
/// must apply atomically, so concurrent callers never lose each other's writes.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    /// Append one feedback entry and bump `updated_at`. Earlier entries stay as they were.
    fn append_feedback(
        &self,
        id: &ApplicationId,
        entry: FeedbackEntry,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn for_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn for_applicant(&self, applicant: &UserId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn for_recruiter(&self, recruiter: &UserId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    /// Overwrite only the cached ranking, leaving status and feedback untouched.
    fn store_ranking(
        &self,
        id: &ApplicationId,
        ranking: DerivedRanking,
    ) -> Result<(), RepositoryError>;
}
