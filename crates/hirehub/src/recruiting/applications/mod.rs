//! Job seeker applications: intake, review, feedback, and ranking.

pub mod domain;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, DerivedRanking,
    FeedbackEntry, FeedbackSubmission, StatusUpdate,
};
pub use ranking::{
    Candidate, JobRequirements, PersistenceSummary, RankedCandidate, RankingEngine,
    RankingFactor, ScoreBreakdown, ScoreComponent,
};
pub use repository::ApplicationRepository;
pub use router::{application_router, RANKING_WRITE_FAILURES_HEADER};
pub use service::{ApplicantView, ApplicationService, RankedApplication, RankingOutcome};
