//! Recruiter-owned job postings.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    EmploymentType, ExperienceRange, JobDraft, JobId, JobPage, JobPosting, JobQuery, JobStatus,
    SalaryRange,
};
pub use repository::JobRepository;
pub use router::job_router;
pub use service::JobService;
