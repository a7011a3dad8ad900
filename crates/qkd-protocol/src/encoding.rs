//! BB84 state preparation and measurement-basis selection.
//!
//! | bit | basis | instruction            | state |
//! |-----|-------|------------------------|-------|
//! | 0   | Z     | identity               | \|0>  |
//! | 0   | X     | Hadamard               | \|+>  |
//! | 1   | Z     | bit-flip               | \|1>  |
//! | 1   | X     | bit-flip then Hadamard | \|->  |

use std::fmt;

use serde::{Deserialize, Serialize};

use qkd_ir::{Circuit, IrResult, QubitId, StandardGate};

use crate::bits::{Basis, Bit};

/// How a sender prepares one qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreparationInstruction {
    /// Leave the qubit in |0>.
    Identity,
    /// Prepare |+>.
    Hadamard,
    /// Prepare |1>.
    BitFlip,
    /// Prepare |->.
    BitFlipHadamard,
}

impl PreparationInstruction {
    /// Gates to apply, in order, to a fresh |0> qubit.
    pub fn gates(self) -> &'static [StandardGate] {
        match self {
            PreparationInstruction::Identity => &[],
            PreparationInstruction::Hadamard => &[StandardGate::H],
            PreparationInstruction::BitFlip => &[StandardGate::X],
            PreparationInstruction::BitFlipHadamard => &[StandardGate::X, StandardGate::H],
        }
    }

    /// Append this preparation on `qubit`.
    pub fn apply(self, circuit: &mut Circuit, qubit: QubitId) -> IrResult<()> {
        for &gate in self.gates() {
            circuit.gate(gate, [qubit])?;
        }
        Ok(())
    }
}

impl fmt::Display for PreparationInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            PreparationInstruction::Identity => "|0>",
            PreparationInstruction::Hadamard => "|+>",
            PreparationInstruction::BitFlip => "|1>",
            PreparationInstruction::BitFlipHadamard => "|->",
        };
        f.write_str(state)
    }
}

/// Map a (bit, basis) choice to its preparation.
pub fn encode(bit: Bit, basis: Basis) -> PreparationInstruction {
    match (bit, basis) {
        (Bit::Zero, Basis::Z) => PreparationInstruction::Identity,
        (Bit::Zero, Basis::X) => PreparationInstruction::Hadamard,
        (Bit::One, Basis::Z) => PreparationInstruction::BitFlip,
        (Bit::One, Basis::X) => PreparationInstruction::BitFlipHadamard,
    }
}

/// The gate a measuring party applies right before measuring in `basis`.
///
/// Z is the native measurement basis, so it needs nothing.
pub fn measurement_instruction(basis: Basis) -> Option<StandardGate> {
    match basis {
        Basis::Z => None,
        Basis::X => Some(StandardGate::H),
    }
}
