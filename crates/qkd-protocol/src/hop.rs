//! One register transmission over a backend.

use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::{debug, instrument, warn};

use qkd_hal::{Backend, ExecutionResult, ValidationResult};

use crate::bits::{Basis, Bit};
use crate::decoding::decode_result;
use crate::error::{ExecutionError, QkdError, QkdResult};
use crate::party::Register;
use crate::session::SessionState;

/// A protocol run is always a single sample.
pub const SHOTS: u32 = 1;

/// A register travelling from a sender to a measuring party.
///
/// The hop records how far it got: `Prepared` once the measuring circuit is
/// built, `Executed` once the backend answered, `Decoded` once the outcome
/// is back in protocol order. Any failure leaves the hop at the last state
/// it reached.
pub struct Hop<'b> {
    index: usize,
    tag: u64,
    backend: &'b dyn Backend,
    timeout: Duration,
    reached: Vec<SessionState>,
}

impl<'b> Hop<'b> {
    /// Create hop `index` over `backend`, bounded by `timeout`.
    pub fn new(index: usize, backend: &'b dyn Backend, timeout: Duration) -> Self {
        Self {
            index,
            tag: 0,
            backend,
            timeout,
            reached: vec![],
        }
    }

    /// Tag the circuit with its session, so that a seeded backend can tell
    /// otherwise identical registers of different sessions apart.
    #[must_use]
    pub fn with_tag(mut self, tag: u64) -> Self {
        self.tag = tag;
        self
    }

    /// Position of this hop in its session.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The states reached so far, in order.
    pub fn reached(&self) -> &[SessionState] {
        &self.reached
    }

    /// The latest state reached, `Init` before anything happened.
    pub fn state(&self) -> SessionState {
        self.reached.last().copied().unwrap_or(SessionState::Init)
    }

    fn advance(&mut self, state: SessionState) {
        debug!(hop = self.index, from = %self.state(), to = %state, "hop transition");
        self.reached.push(state);
    }

    /// Measure `register` in `bases` and decode the outcome.
    #[instrument(skip_all, fields(hop = self.index, qubits = register.len()))]
    pub async fn execute(&mut self, register: &Register, bases: &[Basis]) -> QkdResult<Vec<Bit>> {
        let name = format!("bb84_{:016x}_hop{}", self.tag, self.index);
        let circuit = register.circuit(&name, bases)?;
        if let ValidationResult::Invalid { reasons } = self.backend.validate(&circuit).await? {
            return Err(QkdError::Validation(format!(
                "backend '{}' rejected the register: {}",
                self.backend.name(),
                reasons.join("; ")
            )));
        }
        self.advance(SessionState::Prepared);

        let result = self.run(&circuit).await?;
        self.advance(SessionState::Executed);

        let bits = decode_result(&result, register.len())?;
        self.advance(SessionState::Decoded);
        Ok(bits)
    }

    async fn run(&self, circuit: &qkd_ir::Circuit) -> Result<ExecutionResult, ExecutionError> {
        let deadline = Instant::now() + self.timeout;

        let job_id = timeout_at(deadline, self.backend.submit(circuit, SHOTS))
            .await
            .map_err(|_| ExecutionError::Timeout(self.timeout))??;
        debug!(hop = self.index, job = %job_id, "submitted register");

        match timeout_at(deadline, self.backend.wait(&job_id)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                if let Err(e) = self.backend.cancel(&job_id).await {
                    warn!(job = %job_id, error = %e, "could not cancel timed-out job");
                }
                Err(ExecutionError::Timeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for Hop<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hop")
            .field("index", &self.index)
            .field("tag", &self.tag)
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .field("reached", &self.reached)
            .finish()
    }
}
