//! Trials command implementation.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use qkd_protocol::{DEFAULT_DETECTION_THRESHOLD, TrialRunner, TrialSummary};

use super::common::{OutputFormat, create_backend, print_json, print_summary};
use crate::config::QkdConfig;

/// Execute the trials command.
pub async fn execute(config: &QkdConfig, concurrency: usize, format: OutputFormat) -> Result<()> {
    let backend = create_backend(config)?;
    let trials = config.protocol.trials;

    if format == OutputFormat::Table {
        println!(
            "{} {} BB84 sessions of {} rounds on {}{}",
            style("→").cyan().bold(),
            trials,
            config.protocol.rounds,
            style(backend.name()).yellow(),
            if config.protocol.eavesdropper {
                format!(" ({})", style("Eve intercepting").red())
            } else {
                String::new()
            }
        );
    }

    let progress = ProgressBar::new(trials as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} sessions ({eta})")?
            .progress_chars("█▓░"),
    );

    let outcomes = TrialRunner::new(backend, config.session_config())
        .with_concurrency(concurrency)
        .run(trials, |_| progress.inc(1))
        .await?;
    progress.finish_and_clear();

    let summary = TrialSummary::from_outcomes(&outcomes);
    match format {
        OutputFormat::Table => print_summary(&summary, DEFAULT_DETECTION_THRESHOLD),
        OutputFormat::Json => print_json(&summary)?,
    }
    Ok(())
}
