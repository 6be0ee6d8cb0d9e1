//! Error types for store implementations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a store implementation can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing transport failed (connection lost, statement timeout).
    #[error("transport error: {message}")]
    Transport {
        /// Error message from the driver.
        message: String,
        /// Whether re-dispatching the request may succeed.
        retryable: bool,
    },

    /// A referenced entity does not exist.
    #[error("missing entity: {entity} {id}")]
    MissingEntity {
        /// Entity kind, e.g. `host`.
        entity: &'static str,
        /// The id that failed to resolve.
        id: u64,
    },

    /// The statement produced by the caller is malformed.
    #[error("malformed statement: {0}")]
    MalformedStatement(String),
}

impl StoreError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        StoreError::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        StoreError::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if re-dispatching the request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transport { retryable: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(StoreError::transport_retryable("timeout").is_retryable());
        assert!(!StoreError::transport_fatal("bad credentials").is_retryable());
        assert!(!StoreError::MissingEntity {
            entity: "host",
            id: 9
        }
        .is_retryable());
    }
}
