//! Job postings, applications, feedback, and the applicant ranking pass.
//!
//! Every operation follows the same shape: resolve the caller, check the
//! [`AccessPolicy`], load or mutate a record through a repository trait, and
//! record a [`DomainEvent`] for the notifier to deliver later.

pub mod access;
pub mod applications;
mod error;
pub mod events;
pub mod jobs;
pub mod profiles;
mod repository;

pub use access::{Action, Actor, AccessPolicy, OwnershipPolicy, Resource, Role, UserId};
pub use error::RecruitingError;
pub use events::{DomainEvent, EventOutbox};
pub use repository::RepositoryError;
