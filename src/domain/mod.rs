//! Core business entities, state machines and repository traits

pub mod booking;
pub mod error;
pub mod payment;
pub mod pricing;
pub mod repositories;
pub mod room;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use repositories::RepositoryProvider;
