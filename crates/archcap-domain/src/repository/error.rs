//! Errors shared by every repository port

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Entity not found
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Stream advanced since the aggregate was loaded
    #[error("Concurrent modification of {id}: expected version {expected}, found {actual}")]
    ConcurrencyError {
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Failed to read or persist
    #[error("Persistence error: {message}")]
    PersistenceError { message: String },
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceError {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
