//! Shared helpers for CLI commands.

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};
use console::style;

use qkd_adapter_sim::SimulatorBackend;
use qkd_hal::{Backend, BackendFactory};
use qkd_protocol::bits::bits_to_string;
use qkd_protocol::{SessionReport, TrialSummary};

use crate::config::QkdConfig;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Session flags shared by `run` and `trials`; each overrides the config.
#[derive(Debug, Clone, Default, Args)]
pub struct SessionArgs {
    /// Rounds (qubits) per session
    #[arg(short, long)]
    pub rounds: Option<usize>,

    /// Insert an intercept-resend eavesdropper
    #[arg(long)]
    pub eve: bool,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Backend to use
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Bit-flip probability on the channel
    #[arg(long)]
    pub bit_flip: Option<f64>,

    /// Depolarizing probability on the channel
    #[arg(long)]
    pub depolarizing: Option<f64>,

    /// Readout error probability
    #[arg(long)]
    pub readout_error: Option<f64>,

    /// Backend timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl SessionArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut QkdConfig) {
        if let Some(rounds) = self.rounds {
            config.protocol.rounds = rounds;
        }
        if self.eve {
            config.protocol.eavesdropper = true;
        }
        if let Some(seed) = self.seed {
            config.protocol.seed = Some(seed);
        }
        if let Some(backend) = &self.backend {
            config.backend.name.clone_from(backend);
        }
        if let Some(p) = self.bit_flip {
            config.backend.noise.bit_flip = p;
        }
        if let Some(p) = self.depolarizing {
            config.backend.noise.depolarizing = p;
        }
        if let Some(p) = self.readout_error {
            config.backend.noise.readout_error = p;
        }
        if let Some(t) = self.timeout {
            config.backend.timeout_seconds = t;
        }
    }
}

/// Create the configured backend.
pub fn create_backend(config: &QkdConfig) -> Result<Arc<dyn Backend>> {
    match config.backend.name.to_lowercase().as_str() {
        "simulator" | "sim" => {
            let backend = SimulatorBackend::from_config(config.backend_config())?;
            Ok(Arc::new(backend))
        }
        other => {
            anyhow::bail!("Unknown backend: '{other}'. Available: simulator");
        }
    }
}

/// Print one session report.
pub fn print_report(report: &SessionReport, threshold: f64) {
    println!(
        "\n{} Session {} ({} rounds{})",
        style("✓").green().bold(),
        style(report.final_state).green(),
        report.rounds,
        if report.eavesdropper {
            ", eavesdropper present"
        } else {
            ""
        }
    );
    println!(
        "  Alice's bits = {}",
        style(bits_to_string(&report.sifted_alice)).cyan()
    );
    println!(
        "  Bob's bits   = {}",
        style(bits_to_string(&report.sifted_bob)).cyan()
    );
    println!(
        "  Sifted key:    {} of {} rounds, {} matching",
        report.key_length(),
        report.rounds,
        report.match_count
    );
    println!("  fidelity = {}", style(format!("{:.4}", report.fidelity)).yellow());
    println!("  loss     = {}", style(format!("{:.4}", report.loss)).yellow());
    if let Some(eve) = report.eve_fidelity {
        println!("  Eve agreement with Alice: {eve:.4}");
    }

    if report.eavesdropping_suspected(threshold) {
        println!(
            "\n  {} fidelity below {threshold}: channel may be tapped",
            style("!").red().bold()
        );
    }
}

/// Print a trial summary.
pub fn print_summary(summary: &TrialSummary, threshold: f64) {
    println!(
        "\n{} {} trials: {} completed, {} without key material, {} aborted",
        style("✓").green().bold(),
        summary.trials,
        summary.completed,
        summary.empty,
        summary.aborted
    );

    let Some(mean) = summary.mean_fidelity else {
        println!("  No completed sessions");
        return;
    };
    println!("  Mean fidelity: {}", style(format!("{mean:.4}")).yellow());
    if let Some(sd) = summary.std_dev {
        println!("  Std deviation: {sd:.4}");
    }
    if let Some((lo, hi)) = summary.confidence_interval {
        println!("  95% interval:  [{lo:.4}, {hi:.4}]");
    }
    if let Some(len) = summary.mean_key_length {
        println!("  Mean key length: {len:.1}");
    }

    if summary.eavesdropping_suspected(threshold) {
        println!(
            "\n  {} fidelity clearly below {threshold}: eavesdropping suspected",
            style("!").red().bold()
        );
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
