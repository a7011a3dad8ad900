//! Configuration for the `qkd` CLI.
//!
//! Sources, highest precedence first:
//! 1. Command-line flags
//! 2. Environment variables (`QKD_` prefix)
//! 3. YAML configuration file (`--config`)
//! 4. Default values
//!
//! ```yaml
//! protocol:
//!   rounds: 127
//!   eavesdropper: false
//!   seed: 42
//!   trials: 100
//! backend:
//!   name: simulator
//!   max_qubits: 127
//!   timeout_seconds: 30
//!   noise:
//!     bit_flip: 0.0
//!     readout_error: 0.01
//! logging:
//!   level: info
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qkd_hal::BackendConfig;
use qkd_protocol::SessionConfig;

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QkdConfig {
    /// Protocol parameters.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Execution backend.
    #[serde(default)]
    pub backend: BackendSection,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Protocol parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Rounds (qubits) per session.
    #[serde(default = "default_rounds")]
    pub rounds: usize,

    /// Insert an intercept-resend eavesdropper.
    #[serde(default)]
    pub eavesdropper: bool,

    /// Seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Sessions per `qkd trials` invocation.
    #[serde(default = "default_trials")]
    pub trials: usize,
}

/// Backend selection and noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    /// Backend name.
    #[serde(default = "default_backend")]
    pub name: String,

    /// Register size limit.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Bound on one backend execution, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Noise channels.
    #[serde(default)]
    pub noise: NoiseConfig,
}

/// Noise probabilities; zero disables a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Bit-flip probability on the channel.
    #[serde(default)]
    pub bit_flip: f64,

    /// Depolarizing probability on the channel.
    #[serde(default)]
    pub depolarizing: f64,

    /// Probability that a measured bit is misread.
    #[serde(default)]
    pub readout_error: f64,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level; `-v` flags take precedence.
    #[serde(default)]
    pub level: Option<String>,
}

fn default_rounds() -> usize {
    127
}

fn default_trials() -> usize {
    100
}

fn default_backend() -> String {
    "simulator".to_string()
}

fn default_max_qubits() -> u32 {
    127
}

fn default_timeout() -> u64 {
    30
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            eavesdropper: false,
            seed: None,
            trials: default_trials(),
        }
    }
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            name: default_backend(),
            max_qubits: default_max_qubits(),
            timeout_seconds: default_timeout(),
            noise: NoiseConfig::default(),
        }
    }
}

impl QkdConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.as_ref().display())))?;

        serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration with the following precedence:
    /// 1. Environment variable overrides
    /// 2. File, if provided
    /// 3. Defaults
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QKD_*` variables from the process environment.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; absent keys leave fields unchanged.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QKD_ROUNDS") {
            self.protocol.rounds = parse_var("QKD_ROUNDS", &v)?;
        }
        if let Some(v) = lookup("QKD_EAVESDROPPER") {
            self.protocol.eavesdropper = parse_var("QKD_EAVESDROPPER", &v)?;
        }
        if let Some(v) = lookup("QKD_SEED") {
            self.protocol.seed = Some(parse_var("QKD_SEED", &v)?);
        }
        if let Some(v) = lookup("QKD_TRIALS") {
            self.protocol.trials = parse_var("QKD_TRIALS", &v)?;
        }
        if let Some(v) = lookup("QKD_BACKEND") {
            self.backend.name = v;
        }
        if let Some(v) = lookup("QKD_MAX_QUBITS") {
            self.backend.max_qubits = parse_var("QKD_MAX_QUBITS", &v)?;
        }
        if let Some(v) = lookup("QKD_TIMEOUT") {
            self.backend.timeout_seconds = parse_var("QKD_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("QKD_BIT_FLIP") {
            self.backend.noise.bit_flip = parse_var("QKD_BIT_FLIP", &v)?;
        }
        if let Some(v) = lookup("QKD_DEPOLARIZING") {
            self.backend.noise.depolarizing = parse_var("QKD_DEPOLARIZING", &v)?;
        }
        if let Some(v) = lookup("QKD_READOUT_ERROR") {
            self.backend.noise.readout_error = parse_var("QKD_READOUT_ERROR", &v)?;
        }
        if let Some(v) = lookup("QKD_LOG_LEVEL") {
            self.logging.level = Some(v);
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol.rounds == 0 {
            return Err(ConfigError::ValidationError(
                "protocol.rounds must be at least 1".into(),
            ));
        }
        if self.protocol.rounds > self.backend.max_qubits as usize {
            return Err(ConfigError::ValidationError(format!(
                "protocol.rounds ({}) exceeds backend.max_qubits ({})",
                self.protocol.rounds, self.backend.max_qubits
            )));
        }
        if self.protocol.trials == 0 {
            return Err(ConfigError::ValidationError(
                "protocol.trials must be at least 1".into(),
            ));
        }
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "backend.timeout_seconds must be positive".into(),
            ));
        }

        match self.backend.name.to_lowercase().as_str() {
            "simulator" | "sim" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown backend: '{other}'. Available: simulator"
                )));
            }
        }

        let noise = &self.backend.noise;
        for (name, p) in [
            ("bit_flip", noise.bit_flip),
            ("depolarizing", noise.depolarizing),
            ("readout_error", noise.readout_error),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::ValidationError(format!(
                    "backend.noise.{name} must be in [0, 1], got {p}"
                )));
            }
        }

        if let Some(level) = &self.logging.level {
            match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {}
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "Invalid log level: {other}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Session parameters for one run.
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(self.protocol.rounds)
            .with_eavesdropper(self.protocol.eavesdropper)
            .with_timeout(Duration::from_secs(self.backend.timeout_seconds));
        config.seed = self.protocol.seed;
        config
    }

    /// Backend construction parameters.
    ///
    /// A protocol seed also seeds the simulator so a whole run replays.
    pub fn backend_config(&self) -> BackendConfig {
        let noise = &self.backend.noise;
        let mut config = BackendConfig::new(self.backend.name.to_lowercase())
            .with_extra("max_qubits", self.backend.max_qubits.into());
        for (key, p) in [
            ("bit_flip", noise.bit_flip),
            ("depolarizing", noise.depolarizing),
            ("readout_error", noise.readout_error),
        ] {
            if p > 0.0 {
                config = config.with_extra(key, p.into());
            }
        }
        if let Some(seed) = self.protocol.seed {
            config = config.with_extra("seed", seed.into());
        }
        config
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("{key}={value} is not a valid value")))
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = QkdConfig::default();
        assert_eq!(config.protocol.rounds, 127);
        assert_eq!(config.protocol.trials, 100);
        assert!(!config.protocol.eavesdropper);
        assert_eq!(config.backend.name, "simulator");
        assert_eq!(config.backend.timeout_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "protocol:\n  rounds: 20\n  eavesdropper: true\nbackend:\n  noise:\n    readout_error: 0.02\n"
        )
        .unwrap();

        let config = QkdConfig::from_file(file.path()).unwrap();
        assert_eq!(config.protocol.rounds, 20);
        assert!(config.protocol.eavesdropper);
        assert_eq!(config.protocol.trials, 100);
        assert_eq!(config.backend.max_qubits, 127);
        assert!((config.backend.noise.readout_error - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            QkdConfig::from_file("/nonexistent/qkd.yaml"),
            Err(ConfigError::IoError(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "protocol: [not, a, map]").unwrap();
        assert!(matches!(
            QkdConfig::from_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = QkdConfig::default()
            .merge_vars(vars(&[
                ("QKD_ROUNDS", "64"),
                ("QKD_EAVESDROPPER", "true"),
                ("QKD_SEED", "7"),
                ("QKD_READOUT_ERROR", "0.1"),
                ("QKD_LOG_LEVEL", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.protocol.rounds, 64);
        assert!(config.protocol.eavesdropper);
        assert_eq!(config.protocol.seed, Some(7));
        assert!((config.backend.noise.readout_error - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.backend.name, "simulator");
    }

    #[test]
    fn test_env_parse_error() {
        let err = QkdConfig::default()
            .merge_vars(vars(&[("QKD_ROUNDS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("QKD_ROUNDS=many"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = QkdConfig::default();
        config.protocol.rounds = 0;
        assert!(config.validate().is_err());

        let mut config = QkdConfig::default();
        config.protocol.rounds = 200;
        assert!(config.validate().is_err());

        let mut config = QkdConfig::default();
        config.backend.noise.bit_flip = 1.5;
        assert!(config.validate().is_err());

        let mut config = QkdConfig::default();
        config.backend.name = "ibm_brisbane".into();
        assert!(config.validate().is_err());

        let mut config = QkdConfig::default();
        config.logging.level = Some("loud".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_and_backend_configs() {
        let mut config = QkdConfig::default();
        config.protocol.rounds = 20;
        config.protocol.seed = Some(3);
        config.backend.noise.bit_flip = 0.05;

        let session = config.session_config();
        assert_eq!(session.rounds, 20);
        assert_eq!(session.seed, Some(3));
        assert_eq!(session.timeout, Duration::from_secs(30));

        let backend = config.backend_config();
        assert_eq!(backend.name, "simulator");
        assert_eq!(backend.extra_u64("seed").unwrap(), Some(3));
        assert_eq!(backend.extra_f64("bit_flip").unwrap(), Some(0.05));
        assert_eq!(backend.extra_f64("readout_error").unwrap(), None);
        assert_eq!(backend.extra_u64("max_qubits").unwrap(), Some(127));
    }
}
