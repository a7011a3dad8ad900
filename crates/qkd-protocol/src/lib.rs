//! BB84 Quantum Key Distribution
//!
//! Classical protocol logic for BB84 between Alice and Bob, with an optional
//! intercept-resend eavesdropper. Quantum execution is delegated to any
//! [`qkd_hal::Backend`].
//!
//! # Overview
//!
//! ```text
//! RandomSource -> Party (preparer) -> Register
//!                                        |
//!                                        v
//!                          [Hop: circuit -> backend -> decode]
//!                                        |
//!                          Party (relay, optional) -> Register -> Hop
//!                                        |
//!                                        v
//!                          Party (measurer) -> sift -> SessionReport
//! ```
//!
//! # Example
//!
//! ```ignore
//! use qkd_adapter_sim::SimulatorBackend;
//! use qkd_protocol::{Session, SessionConfig};
//!
//! let backend = SimulatorBackend::new().with_seed(1);
//! let mut session = Session::new(SessionConfig::new(127).with_seed(1))?;
//! let report = session.run(&backend).await?;
//! println!("fidelity = {}", report.fidelity);
//! ```

pub mod bits;
pub mod decoding;
pub mod encoding;
pub mod error;
pub mod hop;
pub mod party;
pub mod random;
pub mod report;
pub mod session;
pub mod sift;
pub mod trials;

pub use bits::{Basis, Bit};
pub use decoding::decode;
pub use encoding::{PreparationInstruction, encode, measurement_instruction};
pub use error::{ExecutionError, QkdError, QkdResult};
pub use hop::Hop;
pub use party::{Party, PartyRecord, Register, Role, StepOutput};
pub use random::RandomSource;
pub use report::{DEFAULT_DETECTION_THRESHOLD, SessionReport};
pub use session::{Session, SessionConfig, SessionState, Transition};
pub use sift::{SiftResult, sift};
pub use trials::{TrialOutcome, TrialRunner, TrialSummary, run_trials};
