//! Party protocol steps.
//!
//! Every participant runs the same [`Party::step`]; its [`Role`] decides
//! what the step does:
//!
//! - a **preparer** draws bits and bases and emits a [`Register`],
//! - a **measurer** draws bases, measures an incoming register over a
//!   [`Hop`] and keeps the decoded bits,
//! - a **relay** measures like a measurer and then prepares a fresh
//!   register from its own bits and bases.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qkd_ir::{Circuit, ClbitId, QubitId};

use crate::bits::{Basis, Bit};
use crate::encoding::{PreparationInstruction, encode, measurement_instruction};
use crate::error::{QkdError, QkdResult};
use crate::hop::Hop;
use crate::random::RandomSource;

/// What a party does in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Prepares and sends; never measures.
    Preparer,
    /// Measures an incoming register.
    Measurer,
    /// Measures, then re-prepares what it saw (intercept-resend).
    Relay,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Preparer => write!(f, "preparer"),
            Role::Measurer => write!(f, "measurer"),
            Role::Relay => write!(f, "relay"),
        }
    }
}

/// Qubits in flight: one preparation per round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    instructions: Vec<PreparationInstruction>,
}

impl Register {
    /// Encode a sender's choices.
    pub fn encode(bits: &[Bit], bases: &[Basis]) -> QkdResult<Self> {
        if bits.len() != bases.len() {
            return Err(QkdError::Validation(format!(
                "{} bits but {} bases",
                bits.len(),
                bases.len()
            )));
        }
        let instructions = bits
            .iter()
            .zip(bases)
            .map(|(&bit, &basis)| encode(bit, basis))
            .collect();
        Ok(Self { instructions })
    }

    /// Number of qubits.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the register holds no qubits.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Preparations in qubit order.
    pub fn instructions(&self) -> &[PreparationInstruction] {
        &self.instructions
    }

    /// The circuit that measures this register in `bases`.
    ///
    /// Preparations, a barrier marking transmission, per-qubit basis
    /// changes, then qubit `i` measured into classical bit `i`.
    pub fn circuit(&self, name: &str, bases: &[Basis]) -> QkdResult<Circuit> {
        if bases.len() != self.len() {
            return Err(QkdError::Validation(format!(
                "register has {} qubits but {} measurement bases were chosen",
                self.len(),
                bases.len()
            )));
        }

        let mut circuit = Circuit::for_rounds(name, self.len())?;
        for (q, instruction) in (0u32..).zip(&self.instructions) {
            instruction.apply(&mut circuit, QubitId(q))?;
        }
        circuit.barrier_all()?;
        for (q, &basis) in (0u32..).zip(bases) {
            if let Some(gate) = measurement_instruction(basis) {
                circuit.gate(gate, [QubitId(q)])?;
            }
            circuit.measure(QubitId(q), ClbitId(q))?;
        }
        Ok(circuit)
    }
}

/// A party's choices and results for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRecord {
    /// Party name, e.g. `"alice"`.
    pub name: String,
    /// Role played.
    pub role: Role,
    /// Bits sent (preparer) or decoded (measurer, relay).
    pub bits: Vec<Bit>,
    /// Bases used.
    pub bases: Vec<Basis>,
}

/// The result of one party step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// What the party chose and saw.
    pub record: PartyRecord,
    /// Register handed to the next hop, if the role sends one.
    pub forwarded: Option<Register>,
}

/// A named participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    name: String,
    role: Role,
}

impl Party {
    /// Create a party.
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Party name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Party role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Run this party's step.
    ///
    /// A preparer takes no incoming register and draws `rounds` choices.
    /// Measurers and relays need the register and the hop it travels over;
    /// `rounds` must match the register length.
    pub async fn step<R: Rng + Send>(
        &self,
        source: &mut RandomSource<R>,
        rounds: usize,
        incoming: Option<(&Register, &mut Hop<'_>)>,
    ) -> QkdResult<StepOutput> {
        match (self.role, incoming) {
            (Role::Preparer, None) => {
                let bits = source.draw_bits(rounds);
                let bases = source.draw_bases(rounds);
                self.prepare(bits, bases)
            }
            (Role::Preparer, Some(_)) => Err(QkdError::Validation(format!(
                "preparer '{}' does not receive a register",
                self.name
            ))),
            (Role::Measurer | Role::Relay, None) => Err(QkdError::Validation(format!(
                "{} '{}' has no register to measure",
                self.role, self.name
            ))),
            (Role::Measurer, Some((register, hop))) => {
                let record = self.measure(source, rounds, register, hop).await?;
                Ok(StepOutput {
                    record,
                    forwarded: None,
                })
            }
            (Role::Relay, Some((register, hop))) => {
                let seen = self.measure(source, rounds, register, hop).await?;
                self.prepare(seen.bits, seen.bases)
            }
        }
    }

    fn prepare(&self, bits: Vec<Bit>, bases: Vec<Basis>) -> QkdResult<StepOutput> {
        let register = Register::encode(&bits, &bases)?;
        debug!(party = %self.name, qubits = register.len(), "prepared register");
        Ok(StepOutput {
            record: PartyRecord {
                name: self.name.clone(),
                role: self.role,
                bits,
                bases,
            },
            forwarded: Some(register),
        })
    }

    async fn measure<R: Rng + Send>(
        &self,
        source: &mut RandomSource<R>,
        rounds: usize,
        register: &Register,
        hop: &mut Hop<'_>,
    ) -> QkdResult<PartyRecord> {
        if register.len() != rounds {
            return Err(QkdError::Validation(format!(
                "expected {rounds} qubits, register has {}",
                register.len()
            )));
        }
        let bases = source.draw_bases(rounds);
        let bits = hop.execute(register, &bases).await?;
        debug!(party = %self.name, bits = bits.len(), "measured register");
        Ok(PartyRecord {
            name: self.name.clone(),
            role: self.role,
            bits,
            bases,
        })
    }
}
