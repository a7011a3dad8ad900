//! QKD Local Simulator
//!
//! A local backend for BB84 registers. A BB84 register never entangles its
//! qubits, so the joint state is a product of independent single-qubit
//! states. The simulator exploits that: each qubit is a two-amplitude
//! statevector, which keeps memory linear in the register size and lets a
//! 127-qubit session run instantly.
//!
//! # Features
//!
//! - **Exact single-qubit amplitudes** with Born-rule sampling
//! - **Noise channels**: bit-flip and depolarizing at the transmission
//!   barrier, readout error at measurement
//! - **Seedable** for reproducible tests
//! - **Backend-native bit order**: the outcome string lists the highest
//!   classical bit first
//!
//! # Example
//!
//! ```ignore
//! use qkd_adapter_sim::SimulatorBackend;
//! use qkd_hal::Backend;
//! use qkd_ir::{Circuit, ClbitId, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new().with_seed(7);
//!
//!     let mut circuit = Circuit::with_size("one", 2, 2);
//!     circuit.x(QubitId(0))?;
//!     circuit.measure_all()?;
//!
//!     let job_id = backend.submit(&circuit, 1).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     // Qubit 0 is the last character.
//!     assert_eq!(result.counts.single_outcome(), Some("01"));
//!     Ok(())
//! }
//! ```

mod qubit_state;
mod simulator;

pub use simulator::SimulatorBackend;
