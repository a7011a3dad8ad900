//! Backend capability introspection.
//!
//! Describes what a backend can do: register size, supported gates, shot
//! limits and the noise channels it applies. The protocol layer checks these
//! before building a register so an oversized session fails fast instead of
//! at submission.

use serde::{Deserialize, Serialize};

use qkd_ir::{NoiseModel, StandardGate};

/// Hardware capabilities of a quantum backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set.
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Additional capability flags, e.g. `"product_state"`, `"seeded"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Noise channels applied by the backend.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub noise: Vec<NoiseModel>,
}

impl Capabilities {
    /// Create capabilities for a simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::single_qubit_clifford(),
            max_shots: 100_000,
            is_simulator: true,
            features: vec!["product_state".into()],
            noise: vec![],
        }
    }

    /// Attach the noise channels the backend applies.
    #[must_use]
    pub fn with_noise(mut self, noise: Vec<NoiseModel>) -> Self {
        self.noise = noise;
        self
    }

    /// Add a capability flag.
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Whether the backend applies any noise.
    pub fn is_noisy(&self) -> bool {
        self.noise.iter().any(|n| n.error_param() > 0.0)
    }
}

/// Gate set supported by a backend (OpenQASM 3 naming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Native gates (execute without decomposition on this backend).
    pub native: Vec<String>,
}

impl GateSet {
    /// The single-qubit gates a BB84 register uses: `id`, `x`, `z`, `h`.
    pub fn single_qubit_clifford() -> Self {
        let gates: Vec<String> = [
            StandardGate::I,
            StandardGate::X,
            StandardGate::Z,
            StandardGate::H,
        ]
        .iter()
        .map(|g| g.name().to_string())
        .collect();
        Self {
            single_qubit: gates.clone(),
            native: gates,
        }
    }

    /// Check whether a gate name is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit.iter().any(|g| g == gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_capabilities() {
        let caps = Capabilities::simulator(127);
        assert_eq!(caps.num_qubits, 127);
        assert!(caps.is_simulator);
        assert!(!caps.is_noisy());
        assert!(caps.gate_set.contains("h"));
        assert!(caps.gate_set.contains("x"));
        assert!(!caps.gate_set.contains("cx"));
    }

    #[test]
    fn test_noisy_capabilities() {
        let caps = Capabilities::simulator(5)
            .with_noise(vec![NoiseModel::ReadoutError { p: 0.01 }])
            .with_feature("seeded");
        assert!(caps.is_noisy());
        assert!(caps.features.contains(&"seeded".to_string()));

        let silent = Capabilities::simulator(5).with_noise(vec![NoiseModel::BitFlip { p: 0.0 }]);
        assert!(!silent.is_noisy());
    }
}
