use super::domain::{JobId, JobPosting};
use crate::recruiting::repository::RepositoryError;

/// Storage abstraction for postings.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
    /// Increment the posting's application count in place and return the new value.
    fn record_application(&self, id: &JobId) -> Result<u32, RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
    fn all(&self) -> Result<Vec<JobPosting>, RepositoryError>;
}
