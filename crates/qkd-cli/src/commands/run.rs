//! Run command implementation.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use qkd_protocol::{DEFAULT_DETECTION_THRESHOLD, QkdError, Session};

use super::common::{OutputFormat, create_backend, print_json, print_report};
use crate::config::QkdConfig;

/// Execute the run command.
pub async fn execute(config: &QkdConfig, format: OutputFormat) -> Result<()> {
    let backend = create_backend(config)?;
    let session_config = config.session_config();
    debug!(?session_config, "starting session");

    if format == OutputFormat::Table {
        println!(
            "{} BB84 with {} rounds on {}{}",
            style("→").cyan().bold(),
            session_config.rounds,
            style(backend.name()).yellow(),
            if session_config.eavesdropper {
                format!(" ({})", style("Eve intercepting").red())
            } else {
                String::new()
            }
        );
    }

    let avail = backend.availability().await?;
    if !avail.is_available {
        anyhow::bail!("Backend '{}' is not available", backend.name());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Exchanging qubits...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut session = Session::new(session_config)?;
    let outcome = session.run(backend.as_ref()).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(report) => match format {
            OutputFormat::Table => print_report(&report, DEFAULT_DETECTION_THRESHOLD),
            OutputFormat::Json => print_json(&report)?,
        },
        Err(e @ QkdError::EmptySift { .. }) => match format {
            OutputFormat::Table => println!(
                "\n{} {}",
                style("○").yellow().bold(),
                style(e.to_string()).yellow()
            ),
            OutputFormat::Json => print_json(&serde_json::json!({
                "final_state": session.state(),
                "error": e.to_string(),
            }))?,
        },
        Err(e) => {
            anyhow::bail!("Session {}: {e}", session.state());
        }
    }

    Ok(())
}
