//! Backends command implementation.

use anyhow::Result;
use console::style;

use qkd_hal::Backend;

use super::common::create_backend;
use crate::config::QkdConfig;

/// Execute the backends command.
pub async fn execute(config: &QkdConfig) -> Result<()> {
    println!("{} Available backends:\n", style("QKD").cyan().bold());

    let backend = create_backend(config)?;
    print_backend(backend.as_ref()).await?;

    Ok(())
}

async fn print_backend(backend: &dyn Backend) -> Result<()> {
    let caps = backend.capabilities();
    let available = backend.availability().await?.is_available;

    println!(
        "  {} {} {}",
        if available {
            style("●").green()
        } else {
            style("○").red()
        },
        style(backend.name()).bold(),
        if caps.is_simulator { "(local)" } else { "" }
    );
    println!("    Qubits: {}", caps.num_qubits);
    println!("    Max shots: {}", caps.max_shots);
    println!("    Gates: {}", caps.gate_set.native.join(", "));
    if caps.is_noisy() {
        let noise: Vec<String> = caps.noise.iter().map(ToString::to_string).collect();
        println!("    Noise: {}", noise.join(", "));
    } else {
        println!("    Noise: none");
    }
    if !caps.features.is_empty() {
        println!("    Features: {}", caps.features.join(", "));
    }
    println!();
    Ok(())
}
