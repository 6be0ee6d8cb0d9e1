//! Error types for linkage requests.

use templink_audit::AuditError;
use templink_expr::ExprError;
use templink_store::StoreError;
use thiserror::Error;

/// Result type for linkage operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors a linkage request can end with.
///
/// Every variant aborts the request; the enclosing transaction rolls back,
/// so no partial write survives.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A pre-flight check failed. User-correctable; nothing was written.
    #[error("{reason}")]
    Validation {
        /// Human-readable diagnostic naming the offending entity.
        reason: String,
    },

    /// A linkage invariant broke mid-request (a template function with no
    /// key-matching host item, an audit detail for an unknown entity).
    #[error("integrity violation: {reason}")]
    Integrity {
        /// Diagnostic for the log.
        reason: String,
    },

    /// The store failed; re-dispatching the request is the caller's call.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LinkError {
    /// Creates a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        LinkError::Validation {
            reason: reason.into(),
        }
    }

    /// Creates an integrity failure.
    pub fn integrity(reason: impl Into<String>) -> Self {
        LinkError::Integrity {
            reason: reason.into(),
        }
    }

    /// True when re-dispatching the request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LinkError::Store(err) if err.is_retryable())
    }
}

impl From<ExprError> for LinkError {
    fn from(err: ExprError) -> Self {
        LinkError::Integrity {
            reason: err.to_string(),
        }
    }
}

impl From<AuditError> for LinkError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Store(store) => LinkError::Store(store),
            other => LinkError::Integrity {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_read_as_their_reason() {
        let err = LinkError::validation("conflicting item key \"cpu.util\" found");
        assert_eq!(err.to_string(), "conflicting item key \"cpu.util\" found");
        assert!(!err.is_retryable());
    }

    #[test]
    fn transient_store_errors_are_retryable() {
        let err = LinkError::from(StoreError::transport_retryable("timeout"));
        assert!(err.is_retryable());
    }

    #[test]
    fn expression_errors_become_integrity() {
        let err = LinkError::from(ExprError::StaleReference { function_id: 8 });
        assert!(matches!(err, LinkError::Integrity { .. }));
    }
}
