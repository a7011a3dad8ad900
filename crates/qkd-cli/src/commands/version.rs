//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - BB84 quantum key distribution sessions",
        style("QKD").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qkd-ir           Circuit intermediate representation");
    println!("  qkd-hal          Hardware abstraction layer");
    println!("  qkd-protocol     Encoding, sifting and session orchestration");
    println!("  qkd-adapter-sim  Local noisy simulator");
    println!("  qkd-cli          Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/qkd-lab/qkd").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
