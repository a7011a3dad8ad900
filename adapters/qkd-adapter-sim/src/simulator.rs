//! Simulator backend implementation.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use qkd_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, ValidationResult,
};
use qkd_ir::{Circuit, InstructionKind, NoiseModel};

use crate::qubit_state::QubitState;

/// Default register limit; matches a 127-qubit device.
const DEFAULT_MAX_QUBITS: u32 = 127;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Local simulator backend.
///
/// Simulates each qubit independently. Circuits must consist of single-qubit
/// gates, barriers and measurements; anything else is rejected by
/// [`Backend::validate`].
///
/// A seeded simulator samples every job from the seed and the circuit alone,
/// so the same circuit always yields the same counts and concurrent jobs
/// cannot perturb each other.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Active jobs.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Seed for per-job samplers; entropy when absent.
    seed: Option<u64>,
    /// Noise channels applied to every qubit.
    noise: Vec<NoiseModel>,
    /// Maximum number of qubits supported.
    max_qubits: u32,
}

impl SimulatorBackend {
    /// Create a new noiseless simulator with an entropy-seeded sampler.
    pub fn new() -> Self {
        Self::build(BackendConfig::new("simulator"), DEFAULT_MAX_QUBITS)
    }

    /// Create a simulator with a custom register limit.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self::build(BackendConfig::new("simulator"), max_qubits)
    }

    /// Seed the sampler for reproducible outcomes.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.with_feature("seeded")
    }

    /// Apply the given noise channels to every simulated qubit.
    #[must_use]
    pub fn with_noise(mut self, noise: Vec<NoiseModel>) -> Self {
        self.capabilities = self.capabilities.with_noise(noise.clone());
        self.noise = noise;
        self
    }

    fn with_feature(mut self, feature: &str) -> Self {
        self.capabilities = self.capabilities.with_feature(feature);
        self
    }

    fn build(config: BackendConfig, max_qubits: u32) -> Self {
        let mut capabilities = Capabilities::simulator(max_qubits);
        capabilities.name.clone_from(&config.name);
        Self {
            config,
            capabilities,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            seed: None,
            noise: vec![],
            max_qubits,
        }
    }

    /// Sampler for one job.
    fn job_rng(&self, circuit: &Circuit) -> StdRng {
        match self.seed {
            Some(seed) => {
                let mut hasher = FxHasher::default();
                seed.hash(&mut hasher);
                circuit.hash(&mut hasher);
                StdRng::seed_from_u64(hasher.finish())
            }
            None => StdRng::from_entropy(),
        }
    }

    fn channel_probability(&self, pick: fn(&NoiseModel) -> Option<f64>) -> f64 {
        self.noise.iter().filter_map(pick).sum::<f64>().min(1.0)
    }

    /// Collect the reasons a circuit cannot run here.
    fn check_circuit(&self, circuit: &Circuit) -> Vec<String> {
        let mut reasons = vec![];
        if circuit.num_qubits() > self.max_qubits as usize {
            reasons.push(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.max_qubits
            ));
        }
        for inst in circuit.instructions() {
            if let InstructionKind::Gate(gate) = &inst.kind {
                if !self.capabilities.gate_set.contains(gate.name()) {
                    reasons.push(format!("Unsupported gate '{}'", gate.name()));
                }
                if inst.qubits.len() != gate.num_qubits() as usize {
                    reasons.push(format!(
                        "Gate '{}' applied to {} qubits",
                        gate.name(),
                        inst.qubits.len()
                    ));
                }
            }
        }
        reasons
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits();
        let num_clbits = circuit.num_clbits();
        debug!(
            "Starting simulation: {} qubits, {} shots, {} instructions",
            num_qubits,
            shots,
            circuit.num_ops()
        );

        let bit_flip = self.channel_probability(|n| match n {
            NoiseModel::BitFlip { p } => Some(*p),
            _ => None,
        });
        let depolarizing = self.channel_probability(|n| match n {
            NoiseModel::Depolarizing { p } => Some(*p),
            _ => None,
        });
        let readout = self.channel_probability(|n| match n {
            NoiseModel::ReadoutError { p } => Some(*p),
            _ => None,
        });

        let rng = &mut self.job_rng(circuit);
        let mut counts = Counts::new();

        for _ in 0..shots {
            let mut qubits = vec![QubitState::zero(); num_qubits];
            let mut transmitted = vec![false; num_qubits];
            let mut clbits = vec![false; num_clbits];

            for inst in circuit.instructions() {
                match &inst.kind {
                    InstructionKind::Gate(gate) => {
                        for q in &inst.qubits {
                            qubits[q.index()].apply(gate.kind);
                        }
                    }
                    // The channel sits between preparation and measurement:
                    // a qubit crosses it at its first barrier.
                    InstructionKind::Barrier => {
                        for q in &inst.qubits {
                            let q = q.index();
                            if !transmitted[q] {
                                transmitted[q] = true;
                                transmit(&mut qubits[q], bit_flip, depolarizing, rng);
                            }
                        }
                    }
                    InstructionKind::Measure => {
                        for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                            let q = q.index();
                            if !transmitted[q] {
                                transmitted[q] = true;
                                transmit(&mut qubits[q], bit_flip, depolarizing, rng);
                            }
                            let mut bit = qubits[q].measure(rng);
                            if readout > 0.0 && rng.gen_bool(readout) {
                                bit = !bit;
                            }
                            clbits[c.index()] = bit;
                        }
                    }
                }
            }

            counts.insert(outcome_to_bitstring(&clbits), 1);
        }

        let elapsed = start.elapsed();
        debug!(
            "Simulation completed in {:?}: {} shots, {} outcomes",
            elapsed,
            counts.total_shots(),
            counts.len()
        );

        let mut result = ExecutionResult::new(counts, shots)
            .with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        if !self.noise.is_empty() {
            let channels: Vec<String> = self.noise.iter().map(ToString::to_string).collect();
            result = result.with_metadata("noise", serde_json::json!(channels));
        }
        result
    }
}

fn transmit(state: &mut QubitState, bit_flip: f64, depolarizing: f64, rng: &mut StdRng) {
    state.bit_flip(bit_flip, rng);
    state.depolarize(depolarizing, rng);
}

/// Render classical bits in backend-native order: highest index first.
fn outcome_to_bitstring(clbits: &[bool]) -> String {
    clbits
        .iter()
        .rev()
        .map(|&b| if b { '1' } else { '0' })
        .collect()
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let reasons = self.check_circuit(circuit);
        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    #[instrument(skip(self, circuit))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} shots requested, simulator accepts 1..={}",
                self.capabilities.max_shots
            )));
        }
        if circuit.num_qubits() > self.max_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.max_qubits
            )));
        }
        let reasons = self.check_circuit(circuit);
        if !reasons.is_empty() {
            return Err(HalError::InvalidCircuit(reasons.join("; ")));
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), shots).with_backend(self.name());

        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.insert(job_id.0.clone(), SimJob { job, result: None });
        }

        debug!("Submitted job: {}", job_id);

        // Local simulation finishes before submit returns.
        let result = self.run_simulation(circuit, shots);

        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(sim_job) = jobs.get_mut(&job_id.0) {
                sim_job.job.transition(JobStatus::Running);
                if sim_job.job.transition(JobStatus::Completed) {
                    sim_job.result = Some(result);
                }
            }
        }

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        sim_job.result.clone().ok_or_else(|| {
            HalError::JobFailed(format!(
                "Job {} has no result (status: {})",
                job_id, sim_job.job.status
            ))
        })
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        match jobs.get_mut(&job_id.0) {
            Some(sim_job) => {
                sim_job.job.transition(JobStatus::Cancelled);
                Ok(())
            }
            None => Err(HalError::JobNotFound(job_id.0.clone())),
        }
    }
}

impl BackendFactory for SimulatorBackend {
    /// Recognised `extra` keys: `max_qubits`, `seed`, `bit_flip`,
    /// `depolarizing`, `readout_error`.
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.extra_u64("max_qubits")? {
            Some(v) => u32::try_from(v).map_err(|_| {
                HalError::Configuration(format!("max_qubits {v} is out of range"))
            })?,
            None => DEFAULT_MAX_QUBITS,
        };

        let mut noise = vec![];
        let channels: [(&str, fn(f64) -> NoiseModel); 3] = [
            ("bit_flip", |p| NoiseModel::BitFlip { p }),
            ("depolarizing", |p| NoiseModel::Depolarizing { p }),
            ("readout_error", |p| NoiseModel::ReadoutError { p }),
        ];
        for (key, make) in channels {
            if let Some(p) = config.extra_f64(key)? {
                let model = make(p);
                model
                    .validate()
                    .map_err(|e| HalError::Configuration(e.to_string()))?;
                noise.push(model);
            }
        }

        let seed = config.extra_u64("seed")?;
        let backend = Self::build(config, max_qubits).with_noise(noise);
        Ok(match seed {
            Some(seed) => backend.with_seed(seed),
            None => backend,
        })
    }
}
