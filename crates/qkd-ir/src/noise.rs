//! Noise channel types.
//!
//! A backend may attach noise channels to the qubits it simulates. The
//! protocol never builds these itself; it only observes their effect as a
//! depressed fidelity between sifted keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// A single-qubit noise channel model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum NoiseModel {
    /// Depolarizing channel: with probability `p`, replaces the state
    /// with the maximally mixed state.
    Depolarizing {
        /// Error probability (0.0 to 1.0).
        p: f64,
    },

    /// Bit-flip channel: flips |0⟩ ↔ |1⟩ with probability `p`.
    BitFlip {
        /// Flip probability (0.0 to 1.0).
        p: f64,
    },

    /// Readout error: measurement reports wrong outcome with probability `p`.
    ReadoutError {
        /// Misclassification probability (0.0 to 1.0).
        p: f64,
    },
}

impl NoiseModel {
    /// Get a human-readable name for this noise model.
    pub fn name(&self) -> &'static str {
        match self {
            NoiseModel::Depolarizing { .. } => "depolarizing",
            NoiseModel::BitFlip { .. } => "bit_flip",
            NoiseModel::ReadoutError { .. } => "readout_error",
        }
    }

    /// Get the error probability of this noise model.
    pub fn error_param(&self) -> f64 {
        match self {
            NoiseModel::Depolarizing { p }
            | NoiseModel::BitFlip { p }
            | NoiseModel::ReadoutError { p } => *p,
        }
    }

    /// Check that the probability lies in `[0, 1]`.
    pub fn validate(&self) -> IrResult<()> {
        let p = self.error_param();
        if (0.0..=1.0).contains(&p) {
            Ok(())
        } else {
            Err(IrError::InvalidNoise {
                channel: self.name().to_string(),
                p,
            })
        }
    }

    /// Whether the channel acts at readout rather than on the state.
    pub fn is_readout(&self) -> bool {
        matches!(self, NoiseModel::ReadoutError { .. })
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(p={:.4})", self.name(), self.error_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_model_names() {
        assert_eq!(NoiseModel::BitFlip { p: 0.1 }.name(), "bit_flip");
        assert_eq!(NoiseModel::Depolarizing { p: 0.1 }.name(), "depolarizing");
        assert!(NoiseModel::ReadoutError { p: 0.1 }.is_readout());
        assert!(!NoiseModel::BitFlip { p: 0.1 }.is_readout());
    }

    #[test]
    fn test_noise_model_display() {
        assert_eq!(
            NoiseModel::ReadoutError { p: 0.02 }.to_string(),
            "readout_error(p=0.0200)"
        );
    }

    #[test]
    fn test_noise_validation() {
        assert!(NoiseModel::BitFlip { p: 0.0 }.validate().is_ok());
        assert!(NoiseModel::BitFlip { p: 1.0 }.validate().is_ok());
        assert!(NoiseModel::BitFlip { p: 1.5 }.validate().is_err());
        assert!(NoiseModel::Depolarizing { p: -0.1 }.validate().is_err());
    }

    #[test]
    fn test_noise_serde_tagged() {
        let json = serde_json::to_string(&NoiseModel::BitFlip { p: 0.25 }).unwrap();
        assert_eq!(json, r#"{"kind":"bit_flip","p":0.25}"#);
    }
}
