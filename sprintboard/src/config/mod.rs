//! Configuration for the `sprintboard` client.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/sprintboard/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that doesn't exist is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::remote::simulated::{DEFAULT_FAILURE_RATE, FailureInjector, FailurePolicy};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Failure rate outside `0.0..=1.0`.
    #[error("failure rate must be between 0 and 1, got {0}")]
    InvalidFailureRate(f64),
}

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    remote: RemoteFileConfig,
    board: BoardFileConfig,
    ui: UiFileConfig,
}

/// `[remote]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RemoteFileConfig {
    failure_rate: Option<f64>,
    latency_ms: Option<u64>,
    seed: Option<u64>,
}

/// `[board]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    event_buffer: Option<usize>,
}

/// `[ui]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    show_ids: Option<bool>,
    poll_timeout_ms: Option<u64>,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    // -- Remote --
    /// Probability that a simulated request fails.
    pub failure_rate: f64,
    /// Delay added to every simulated response.
    pub latency: Duration,
    /// RNG seed for reproducible failures.
    pub seed: Option<u64>,

    // -- Board --
    /// Capacity of the board event channel.
    pub event_buffer: usize,

    // -- UI --
    /// Show task ids next to titles.
    pub show_ids: bool,
    /// How long the event loop waits for a key before redrawing.
    pub poll_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            failure_rate: DEFAULT_FAILURE_RATE,
            latency: Duration::from_millis(300),
            seed: None,
            event_buffer: 64,
            show_ids: true,
            poll_timeout: Duration::from_millis(50),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit config file cannot be read or
    /// parsed, or if the resolved failure rate is out of range.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file).validate()
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            failure_rate: cli
                .failure_rate
                .or(file.remote.failure_rate)
                .unwrap_or(defaults.failure_rate),
            latency: cli
                .latency_ms
                .or(file.remote.latency_ms)
                .map_or(defaults.latency, Duration::from_millis),
            seed: cli.seed.or(file.remote.seed),
            event_buffer: file.board.event_buffer.unwrap_or(defaults.event_buffer),
            show_ids: file.ui.show_ids.unwrap_or(defaults.show_ids),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&self.failure_rate) {
            Ok(self)
        } else {
            Err(ConfigError::InvalidFailureRate(self.failure_rate))
        }
    }

    /// Failure policy for the simulated service.
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.failure_rate <= 0.0 {
            FailurePolicy::Never
        } else if self.failure_rate >= 1.0 {
            FailurePolicy::Always
        } else {
            FailurePolicy::Random {
                rate: self.failure_rate,
            }
        }
    }

    /// Failure injector seeded from this configuration.
    #[must_use]
    pub fn failure_injector(&self) -> FailureInjector {
        FailureInjector::new(self.failure_policy(), self.seed)
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal kanban board")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/sprintboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Probability (0..=1) that a simulated request fails.
    #[arg(long, env = "SPRINTBOARD_FAILURE_RATE")]
    pub failure_rate: Option<f64>,

    /// Simulated response latency in milliseconds.
    #[arg(long, env = "SPRINTBOARD_LATENCY_MS")]
    pub latency_ms: Option<u64>,

    /// Seed for the failure RNG.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "SPRINTBOARD_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/sprintboard.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Load and parse a TOML config file.
///
/// An explicit path must exist; the default path may be missing.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("sprintboard").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
