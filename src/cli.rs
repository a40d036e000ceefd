//! CLI command implementations for civgrid.

pub(crate) mod batch;
pub(crate) mod config;
pub(crate) mod run;

mod output;

use civgrid::GameConfig;
use civgrid::driver::{DriverError, Seat};
use civgrid::error::ConfigError;
use civgrid::strategy::StrategyKind;
use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `batch` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BatchFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// Strategy names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StrategyArg {
    /// Highest money utility on an empty cell.
    Economic,
    /// Highest reputation utility on an empty cell.
    Reputation,
    /// Uniform over affordable actions.
    Balanced,
    /// Uniform over all action ids.
    Random,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Economic => Self::Economic,
            StrategyArg::Reputation => Self::Reputation,
            StrategyArg::Balanced => Self::Balanced,
            StrategyArg::Random => Self::Random,
        }
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<DriverError> for CliError {
    fn from(e: DriverError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

/// Install the logger.
///
/// With a log file, `info` and above go to the file, truncated first.
/// Otherwise only warnings reach stderr. `RUST_LOG` overrides both.
pub(crate) fn init_logging(log_file: Option<&Path>) -> Result<(), CliError> {
    let default_level = if log_file.is_some() { "info" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));

    if let Some(path) = log_file {
        let file = File::create(path).map_err(|e| {
            CliError::new(format!("Failed to create log file {}: {e}", path.display()))
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder
        .format_timestamp_secs()
        .try_init()
        .map_err(|e| CliError::new(format!("Failed to initialize logging: {e}")))
}

/// Load the config file, or the defaults, and apply a grid size override.
pub(crate) fn load_config(
    path: Option<&Path>,
    grid_size: Option<u16>,
) -> Result<Arc<GameConfig>, CliError> {
    let mut config = match path {
        Some(path) => GameConfig::from_json_file(path).map_err(|e| {
            CliError::new(format!("Failed to load {}: {e}", path.display()))
        })?,
        None => GameConfig::default(),
    };
    if let Some(size) = grid_size {
        config.grid_size = size;
    }
    config.validate()?;
    Ok(Arc::new(config))
}

/// Seats named P1, P2, ... for the given strategies, or the default roster.
pub(crate) fn build_roster(strategies: &[StrategyArg]) -> Vec<Seat> {
    if strategies.is_empty() {
        return Seat::default_roster();
    }
    strategies
        .iter()
        .enumerate()
        .map(|(i, &arg)| Seat::new(format!("P{}", i + 1), arg.into()))
        .collect()
}

/// Use the given seed or derive one from the clock.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos() & u128::from(u64::MAX)).unwrap_or(42))
            .unwrap_or(42)
    })
}
