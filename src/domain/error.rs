//! Domain errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            // DB errors mapped from repositories contain "Database error:" prefix
            DomainError::Validation(msg) => msg.starts_with("Database error:"),
            _ => false,
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
