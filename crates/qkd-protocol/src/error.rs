//! Protocol error types.

use std::time::Duration;

use qkd_hal::HalError;
use qkd_ir::IrError;
use thiserror::Error;

/// Result type for protocol operations.
pub type QkdResult<T> = Result<T, QkdError>;

/// Errors that can end a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QkdError {
    /// A caller broke a length or shape contract.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend failed or returned something that is not a measurement.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// The two basis sequences never agreed, so there is no key material.
    #[error("No shared key material: bases disagree at all {rounds} rounds")]
    EmptySift {
        /// Number of rounds compared.
        rounds: usize,
    },

    /// Register construction failed.
    #[error("Circuit error: {0}")]
    Ir(#[from] IrError),

    /// A spawned session task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(String),
}

impl QkdError {
    /// Whether the error came from the execution boundary.
    pub fn is_execution(&self) -> bool {
        matches!(self, QkdError::Execution(_))
    }

    /// Whether the error is the "no shared key material" outcome.
    pub fn is_empty_sift(&self) -> bool {
        matches!(self, QkdError::EmptySift { .. })
    }
}

/// Failures at the backend boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutionError {
    /// The backend reported an error, including cancellation.
    #[error(transparent)]
    Backend(#[from] HalError),

    /// The backend did not finish within the configured bound.
    #[error("Backend did not answer within {0:?}")]
    Timeout(Duration),

    /// The backend answered, but not with a single well-formed bit-string.
    #[error("Malformed outcome: {0}")]
    MalformedOutcome(String),
}

impl From<HalError> for QkdError {
    fn from(e: HalError) -> Self {
        QkdError::Execution(ExecutionError::Backend(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_error_maps_to_execution() {
        let err: QkdError = HalError::JobCancelled.into();
        assert!(err.is_execution());
        assert!(!err.is_empty_sift());
    }

    #[test]
    fn test_messages() {
        let err = QkdError::EmptySift { rounds: 4 };
        assert_eq!(
            err.to_string(),
            "No shared key material: bases disagree at all 4 rounds"
        );

        let err: QkdError = ExecutionError::MalformedOutcome("length 3, expected 4".into()).into();
        assert_eq!(
            err.to_string(),
            "Execution error: Malformed outcome: length 3, expected 4"
        );
    }
}
