//! QKD Circuit Intermediate Representation
//!
//! This crate provides the data structures the protocol layer uses to describe
//! a register of qubits to a quantum backend: which single-qubit gates prepare
//! each qubit, which gates rotate it into the measurement basis, and which
//! classical bit receives each measurement.
//!
//! The IR is deliberately a flat instruction list. BB84 registers never
//! entangle qubits, so no dependency graph is needed to schedule them.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] (I, X, Z, H) wrapped in a labelled [`Gate`]
//! - **Instructions**: [`Instruction`] combining a gate or measurement with operands
//! - **Circuit**: [`Circuit`] builder API
//! - **Noise**: [`NoiseModel`] channels a simulator can apply
//!
//! # Example: Preparing |−⟩ and measuring in X
//!
//! ```rust
//! use qkd_ir::{Circuit, ClbitId, QubitId};
//!
//! let mut circuit = Circuit::with_size("minus", 1, 1);
//! let q = QubitId(0);
//!
//! circuit.x(q).unwrap().h(q).unwrap();
//! circuit.barrier_all().unwrap();
//! circuit.h(q).unwrap().measure(q, ClbitId(0)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 1);
//! assert_eq!(circuit.depth(), 4);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod noise;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{Gate, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use noise::NoiseModel;
pub use qubit::{ClbitId, QubitId};
