//! Session orchestration.
//!
//! A session walks `Init -> Prepared -> Executed -> Decoded -> Sifted ->
//! Done`. With an eavesdropper the register crosses two hops: the first hop
//! ends with Eve's decoded bits, which (with her bases) become the sender
//! side of the second hop. A backend failure ends the session in `Aborted`
//! and nothing is sifted. Bases that never agree end it in `NoKey`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use qkd_hal::Backend;

use crate::error::{QkdError, QkdResult};
use crate::hop::Hop;
use crate::party::{Party, Role};
use crate::random::RandomSource;
use crate::report::SessionReport;
use crate::sift::sift;

/// Rounds used when nothing else is configured; one per qubit of a
/// 127-qubit device.
pub const DEFAULT_ROUNDS: usize = 127;

/// Default bound on one backend execution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a session (or one of its hops) stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing has happened yet.
    Init,
    /// The measuring circuit for a hop is built.
    Prepared,
    /// The backend returned an outcome.
    Executed,
    /// The outcome is decoded into protocol order.
    Decoded,
    /// Sender and receiver keys are reconciled.
    Sifted,
    /// Statistics are available.
    Done,
    /// Sifting left no shared key material.
    NoKey,
    /// The session failed before sifting.
    Aborted,
}

impl SessionState {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Done | SessionState::NoKey | SessionState::Aborted
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Init => "INIT",
            SessionState::Prepared => "PREPARED",
            SessionState::Executed => "EXECUTED",
            SessionState::Decoded => "DECODED",
            SessionState::Sifted => "SIFTED",
            SessionState::Done => "DONE",
            SessionState::NoKey => "NO_KEY",
            SessionState::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// A recorded state change; `hop` is `None` for session-level steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Hop the transition belongs to.
    pub hop: Option<usize>,
    /// State entered.
    pub state: SessionState,
}

/// Parameters of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Number of rounds (qubits).
    pub rounds: usize,
    /// Whether Eve intercepts and resends every qubit.
    pub eavesdropper: bool,
    /// Seed for all parties' choices; entropy when `None`.
    pub seed: Option<u64>,
    /// Bound on each backend execution.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            eavesdropper: false,
            seed: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Config for `rounds` rounds with defaults otherwise.
    pub fn new(rounds: usize) -> Self {
        Self {
            rounds,
            ..Self::default()
        }
    }

    /// Enable or disable the intercept-resend eavesdropper.
    #[must_use]
    pub fn with_eavesdropper(mut self, eavesdropper: bool) -> Self {
        self.eavesdropper = eavesdropper;
        self
    }

    /// Fix the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the per-execution timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the config before any backend is touched.
    pub fn validate(&self) -> QkdResult<()> {
        if self.rounds == 0 {
            return Err(QkdError::Validation(
                "a session needs at least one round".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(QkdError::Validation("timeout must be positive".into()));
        }
        Ok(())
    }
}

/// One BB84 run.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    transitions: Vec<Transition>,
}

impl Session {
    /// Create a session in `Init`.
    pub fn new(config: SessionConfig) -> QkdResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SessionState::Init,
            transitions: vec![Transition {
                hop: None,
                state: SessionState::Init,
            }],
        })
    }

    /// The session parameters.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    fn enter(&mut self, hop: Option<usize>, state: SessionState) {
        self.state = state;
        self.transitions.push(Transition { hop, state });
    }

    fn absorb(&mut self, hop: &Hop<'_>) {
        for &state in hop.reached() {
            self.enter(Some(hop.index()), state);
        }
    }

    /// Run the session to completion against `backend`.
    ///
    /// On success the session is `Done`. An empty sift leaves it in
    /// `NoKey` and returns [`QkdError::EmptySift`]; every other error
    /// leaves it `Aborted`.
    #[instrument(skip(self, backend), fields(
        backend = backend.name(),
        rounds = self.config.rounds,
        eve = self.config.eavesdropper,
    ))]
    pub async fn run(&mut self, backend: &dyn Backend) -> QkdResult<SessionReport> {
        if self.state != SessionState::Init {
            return Err(QkdError::Validation(format!(
                "session already ran (state {})",
                self.state
            )));
        }

        let mut source = match self.config.seed {
            Some(seed) => RandomSource::seeded(seed),
            None => RandomSource::from_entropy(),
        };

        match self.execute(backend, &mut source).await {
            Ok(report) => Ok(report),
            Err(e) if e.is_empty_sift() => {
                warn!("no shared key material: {}", e);
                self.enter(None, SessionState::NoKey);
                Err(e)
            }
            Err(e) => {
                warn!(state = %self.state, "session aborted: {}", e);
                self.enter(None, SessionState::Aborted);
                Err(e)
            }
        }
    }

    async fn execute(
        &mut self,
        backend: &dyn Backend,
        source: &mut RandomSource,
    ) -> QkdResult<SessionReport> {
        let n = self.config.rounds;
        let capacity = backend.capabilities().num_qubits as usize;
        if n > capacity {
            return Err(QkdError::Validation(format!(
                "{n} rounds need {n} qubits, backend '{}' has {capacity}",
                backend.name()
            )));
        }

        let tag = source.next_seed();
        let mut alice_source = source.fork();
        let mut eve_source = source.fork();
        let mut bob_source = source.fork();

        let alice = Party::new("alice", Role::Preparer);
        let sent = alice.step(&mut alice_source, n, None).await?;
        let mut register = sent
            .forwarded
            .ok_or_else(|| QkdError::Validation("preparer sent no register".into()))?;
        debug!(qubits = register.len(), "alice prepared register");

        let mut eve_record = None;
        let mut next_hop = 0;
        if self.config.eavesdropper {
            let eve = Party::new("eve", Role::Relay);
            let mut hop = Hop::new(next_hop, backend, self.config.timeout).with_tag(tag);
            let relayed = eve
                .step(&mut eve_source, n, Some((&register, &mut hop)))
                .await;
            self.absorb(&hop);
            let relayed = relayed?;
            register = relayed
                .forwarded
                .ok_or_else(|| QkdError::Validation("relay forwarded no register".into()))?;
            eve_record = Some(relayed.record);
            next_hop += 1;
        }

        let bob = Party::new("bob", Role::Measurer);
        let mut hop = Hop::new(next_hop, backend, self.config.timeout).with_tag(tag);
        let received = bob
            .step(&mut bob_source, n, Some((&register, &mut hop)))
            .await;
        self.absorb(&hop);
        let received = received?;

        let alice = sent.record;
        let bob = received.record;
        let sifted = sift(&alice.bases, &alice.bits, &bob.bases, &bob.bits)?;
        self.enter(None, SessionState::Sifted);
        debug!(sifted = sifted.len(), matches = sifted.match_count, "sifted keys");

        let fidelity = sifted.fidelity()?;
        self.enter(None, SessionState::Done);
        info!(
            sifted = sifted.len(),
            fidelity = fidelity,
            "session complete"
        );

        SessionReport::new(alice, bob, eve_record, sifted, self.state)
    }
}
