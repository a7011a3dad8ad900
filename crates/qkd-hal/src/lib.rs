//! QKD Hardware Abstraction Layer
//!
//! This crate is the boundary between the BB84 protocol logic and whatever
//! actually realizes superposition and measurement: a local simulator, a
//! noisy emulator, or a remote device.
//!
//! # Overview
//!
//! The HAL provides:
//! - A common [`Backend`] trait for job submission and management
//! - [`Capabilities`] to describe register size, gate set and noise
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//!
//! The protocol submits exactly one circuit per hop with a single shot, so a
//! completed job carries exactly one bit-string in backend-native order
//! (highest qubit index first).
//!
//! # Implementing a Custom Backend
//!
//! ```ignore
//! use qkd_hal::{
//!     Backend, BackendAvailability, Capabilities, ValidationResult,
//!     JobId, JobStatus, ExecutionResult, HalResult,
//! };
//! use qkd_ir::Circuit;
//! use async_trait::async_trait;
//!
//! struct MyBackend {
//!     capabilities: Capabilities,
//! }
//!
//! #[async_trait]
//! impl Backend for MyBackend {
//!     fn name(&self) -> &str { "my_backend" }
//!
//!     fn capabilities(&self) -> &Capabilities {
//!         &self.capabilities
//!     }
//!
//!     async fn availability(&self) -> HalResult<BackendAvailability> {
//!         Ok(BackendAvailability::always_available())
//!     }
//!
//!     async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
//!         Ok(ValidationResult::Valid)
//!     }
//!
//!     async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
//!         # todo!()
//!     }
//!
//!     async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
//!         # todo!()
//!     }
//!
//!     async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
//!         # todo!()
//!     }
//!
//!     async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
//!         # todo!()
//!     }
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult};
pub use capability::{Capabilities, GateSet};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
