//! CLI configuration management
//!
//! Resolves a [`SimulationConfig`] from TOML files, `HESTON_*` environment
//! variables and command-line flags.
//!
//! Priority (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in sample parameters

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Args;
use pricer_heston::mc::ExecutionMode;
use pricer_heston::{SimulationConfig, SimulationConfigBuilder};
use serde::Deserialize;

use crate::{CliError, Result};

/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "HESTON_";

/// Log levels accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CliError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Contents of a TOML configuration file.
///
/// ```toml
/// log_level = "debug"
///
/// [simulation]
/// kappa = 3.0
/// strike = 1.1
/// n_blocks = 40
/// execution = "sequential"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Default log level
    pub log_level: Option<LogLevel>,
    /// Partial simulation parameters
    pub simulation: SimulationConfigBuilder,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| CliError::ConfigFileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| CliError::ConfigFileParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Simulation parameter flags shared by the `run` and `check` commands
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Mean-reversion rate of the variance
    #[arg(long)]
    pub kappa: Option<f64>,

    /// Long-run variance
    #[arg(long)]
    pub theta: Option<f64>,

    /// Volatility of variance
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Initial variance
    #[arg(long)]
    pub v0: Option<f64>,

    /// Price/variance correlation
    #[arg(long, allow_negative_numbers = true)]
    pub rho: Option<f64>,

    /// Initial spot
    #[arg(long)]
    pub spot: Option<f64>,

    /// Option strike
    #[arg(long)]
    pub strike: Option<f64>,

    /// Continuously compounded risk-free rate
    #[arg(long, allow_negative_numbers = true)]
    pub rate: Option<f64>,

    /// Continuous dividend yield
    #[arg(long, allow_negative_numbers = true)]
    pub dividend_yield: Option<f64>,

    /// Maturity in years
    #[arg(long)]
    pub maturity: Option<f64>,

    /// Paths per block
    #[arg(long)]
    pub n_paths: Option<usize>,

    /// Number of independent blocks (at least 2)
    #[arg(long)]
    pub n_blocks: Option<usize>,

    /// Time steps per path
    #[arg(long)]
    pub n_steps: Option<usize>,

    /// Master seed (drawn from OS entropy when omitted)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Block scheduling: parallel (thread pool) or sequential
    #[arg(long)]
    pub execution: Option<ExecutionMode>,

    /// Floored-variance fraction that triggers a warning
    #[arg(long)]
    pub clamp_warning_threshold: Option<f64>,

    /// Include the last block's paths in JSON output (`--export-paths false`
    /// turns off an export enabled by the environment or config file)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub export_paths: Option<bool>,
}

impl ConfigArgs {
    /// Parameters explicitly given on the command line.
    pub fn overrides(&self) -> SimulationConfigBuilder {
        let mut builder = SimulationConfigBuilder::default();
        if let Some(v) = self.kappa {
            builder = builder.kappa(v);
        }
        if let Some(v) = self.theta {
            builder = builder.theta(v);
        }
        if let Some(v) = self.epsilon {
            builder = builder.epsilon(v);
        }
        if let Some(v) = self.v0 {
            builder = builder.v0(v);
        }
        if let Some(v) = self.rho {
            builder = builder.rho(v);
        }
        if let Some(v) = self.spot {
            builder = builder.spot(v);
        }
        if let Some(v) = self.strike {
            builder = builder.strike(v);
        }
        if let Some(v) = self.rate {
            builder = builder.rate(v);
        }
        if let Some(v) = self.dividend_yield {
            builder = builder.dividend_yield(v);
        }
        if let Some(v) = self.maturity {
            builder = builder.maturity(v);
        }
        if let Some(v) = self.n_paths {
            builder = builder.n_paths(v);
        }
        if let Some(v) = self.n_blocks {
            builder = builder.n_blocks(v);
        }
        if let Some(v) = self.n_steps {
            builder = builder.n_steps(v);
        }
        if let Some(v) = self.seed {
            builder = builder.seed(v);
        }
        if let Some(v) = self.execution {
            builder = builder.execution(v);
        }
        if let Some(v) = self.clamp_warning_threshold {
            builder = builder.clamp_warning_threshold(v);
        }
        if let Some(v) = self.export_paths {
            builder = builder.export_paths(v);
        }
        builder
    }
}

/// Load simulation parameters from `HESTON_*` environment variables.
///
/// `lookup` maps a full variable name to its value; pass
/// `|key| std::env::var(key).ok()` for the process environment.
pub fn builder_from_env<F>(lookup: F) -> Result<SimulationConfigBuilder>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = SimulationConfigBuilder::default();

    if let Some(v) = parse_env(&lookup, "KAPPA")? {
        builder = builder.kappa(v);
    }
    if let Some(v) = parse_env(&lookup, "THETA")? {
        builder = builder.theta(v);
    }
    if let Some(v) = parse_env(&lookup, "EPSILON")? {
        builder = builder.epsilon(v);
    }
    if let Some(v) = parse_env(&lookup, "V0")? {
        builder = builder.v0(v);
    }
    if let Some(v) = parse_env(&lookup, "RHO")? {
        builder = builder.rho(v);
    }
    if let Some(v) = parse_env(&lookup, "SPOT")? {
        builder = builder.spot(v);
    }
    if let Some(v) = parse_env(&lookup, "STRIKE")? {
        builder = builder.strike(v);
    }
    if let Some(v) = parse_env(&lookup, "RATE")? {
        builder = builder.rate(v);
    }
    if let Some(v) = parse_env(&lookup, "DIVIDEND_YIELD")? {
        builder = builder.dividend_yield(v);
    }
    if let Some(v) = parse_env(&lookup, "MATURITY")? {
        builder = builder.maturity(v);
    }
    if let Some(v) = parse_env(&lookup, "N_PATHS")? {
        builder = builder.n_paths(v);
    }
    if let Some(v) = parse_env(&lookup, "N_BLOCKS")? {
        builder = builder.n_blocks(v);
    }
    if let Some(v) = parse_env(&lookup, "N_STEPS")? {
        builder = builder.n_steps(v);
    }
    if let Some(v) = parse_env(&lookup, "SEED")? {
        builder = builder.seed(v);
    }
    if let Some(v) = parse_env::<ExecutionMode, _>(&lookup, "EXECUTION")? {
        builder = builder.execution(v);
    }
    if let Some(v) = parse_env(&lookup, "CLAMP_WARNING_THRESHOLD")? {
        builder = builder.clamp_warning_threshold(v);
    }
    if let Some(v) = parse_env(&lookup, "EXPORT_PATHS")? {
        builder = builder.export_paths(v);
    }

    Ok(builder)
}

fn parse_env<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let key = format!("{}{}", ENV_PREFIX, name);
    match lookup(&key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| CliError::InvalidEnv {
                key,
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Fully resolved CLI configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub simulation: SimulationConfig,
    pub log_level: LogLevel,
}

/// Build configuration from all sources
///
/// `log_level` is the `--log-level` flag (which clap already falls back to
/// `HESTON_LOG_LEVEL` for).
pub fn build_config<F>(
    args: &ConfigArgs,
    log_level: Option<&str>,
    env_lookup: F,
) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    let simulation = SimulationConfigBuilder::sample()
        .merge(file.simulation)
        .merge(builder_from_env(env_lookup)?)
        .merge(args.overrides())
        .build()?;

    let log_level = match log_level {
        Some(level) => LogLevel::from_str(level)?,
        None => file.log_level.unwrap_or_default(),
    };

    Ok(ResolvedConfig {
        simulation,
        log_level,
    })
}
