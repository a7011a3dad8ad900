//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit:?} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit not found in circuit.
    #[error("Classical bit {clbit:?} not found in circuit{}", format_gate_context(.gate_name))]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Circuit size does not fit the identifier space.
    #[error("Circuit size {0} exceeds the qubit identifier range")]
    TooManyQubits(usize),

    /// Noise parameter outside [0, 1].
    #[error("Invalid noise probability {p} for {channel}")]
    InvalidNoise {
        /// Channel name.
        channel: String,
        /// Offending probability.
        p: f64,
    },
}

#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_gate_context() {
        let err = IrError::QubitNotFound {
            qubit: QubitId(7),
            gate_name: Some("h".into()),
        };
        assert_eq!(err.to_string(), "Qubit QubitId(7) not found in circuit (gate: h)");

        let err = IrError::ClbitNotFound {
            clbit: ClbitId(3),
            gate_name: None,
        };
        assert_eq!(err.to_string(), "Classical bit ClbitId(3) not found in circuit");
    }
}
