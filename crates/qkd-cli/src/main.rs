//! QKD Command-Line Interface
//!
//! Runs BB84 key distribution sessions against a circuit backend and
//! reports sifted keys, fidelity and eavesdropping statistics.
//!
//! ```text
//! qkd run --rounds 16 --seed 7
//! qkd run --eve --format json
//! qkd trials --trials 500 --eve --depolarizing 0.02
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::common::{OutputFormat, SessionArgs};
use commands::{backends, run, trials, version};
use config::QkdConfig;

/// QKD - BB84 quantum key distribution over a simulated channel
#[derive(Parser)]
#[command(name = "qkd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "QKD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single BB84 session
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run many sessions and estimate fidelity statistics
    Trials {
        #[command(flatten)]
        session: SessionArgs,

        /// Number of sessions
        #[arg(short = 'n', long)]
        trials: Option<usize>,

        /// Sessions running at once
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// List available backends
    Backends,

    /// Show version information
    Version,
}

fn log_filter(verbose: u8, configured: Option<&str>) -> String {
    match (verbose, configured) {
        (0, Some(level)) => level.to_string(),
        (0, None) => "warn".into(),
        (1, _) => "info".into(),
        (2, _) => "debug".into(),
        _ => "trace".into(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match QkdConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Logs go to stderr so JSON output stays parseable
    let filter = log_filter(cli.verbose, config.logging.level.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run { session, format } => {
            let mut config = config;
            session.apply(&mut config);
            match config.validate() {
                Ok(()) => run::execute(&config, format).await,
                Err(e) => Err(e.into()),
            }
        }

        Commands::Trials {
            session,
            trials: count,
            concurrency,
            format,
        } => {
            let mut config = config;
            session.apply(&mut config);
            if let Some(count) = count {
                config.protocol.trials = count;
            }
            match config.validate() {
                Ok(()) => trials::execute(&config, concurrency, format).await,
                Err(e) => Err(e.into()),
            }
        }

        Commands::Backends => backends::execute(&config).await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["qkd", "run"]).unwrap();
        match cli.command {
            Commands::Run { session, format } => {
                assert_eq!(session.rounds, None);
                assert!(!session.eve);
                assert_eq!(format, OutputFormat::Table);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "qkd", "-vv", "run", "-r", "32", "--eve", "--seed", "9", "--bit-flip", "0.1",
            "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run { session, format } => {
                assert_eq!(session.rounds, Some(32));
                assert!(session.eve);
                assert_eq!(session.seed, Some(9));
                assert_eq!(session.bit_flip, Some(0.1));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_trials() {
        let cli = Cli::try_parse_from(["qkd", "trials", "-n", "50", "--concurrency", "2"]).unwrap();
        match cli.command {
            Commands::Trials {
                trials,
                concurrency,
                ..
            } => {
                assert_eq!(trials, Some(50));
                assert_eq!(concurrency, 2);
            }
            _ => panic!("expected trials"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        assert!(Cli::try_parse_from(["qkd", "run", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["qkd", "run", "--rounds", "many"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["qkd", "backends", "--config", "qkd.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("qkd.yaml")));
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0, None), "warn");
        assert_eq!(log_filter(0, Some("debug")), "debug");
        assert_eq!(log_filter(1, Some("error")), "info");
        assert_eq!(log_filter(3, None), "trace");
    }

    #[test]
    fn test_session_args_override_config() {
        let mut config = QkdConfig::default();
        let args = SessionArgs {
            rounds: Some(8),
            eve: true,
            depolarizing: Some(0.05),
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.protocol.rounds, 8);
        assert!(config.protocol.eavesdropper);
        assert_eq!(config.backend.noise.depolarizing, 0.05);
        assert_eq!(config.backend.noise.bit_flip, 0.0);
    }
}
