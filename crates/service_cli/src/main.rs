//! Heston CLI - Command Line Pricing of European Options
//!
//! Operational entry point for the Heston Monte Carlo pricer.
//!
//! # Commands
//!
//! - `heston run` - Price a European call and put
//! - `heston check` - Validate and print the resolved configuration
//!
//! # Configuration
//!
//! Parameters are layered (highest priority first): command-line flags,
//! `HESTON_*` environment variables, a TOML file given with `--config`, and
//! the built-in sample parameter set.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::run::OutputFormat;
use config::{build_config, ConfigArgs};

/// Heston Monte Carlo option pricer
#[derive(Parser)]
#[command(name = "heston")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, env = "HESTON_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a European call and put by Monte Carlo simulation
    Run {
        #[command(flatten)]
        args: ConfigArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Validate the configuration and print derived quantities
    Check {
        #[command(flatten)]
        args: ConfigArgs,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_lookup = |key: &str| std::env::var(key).ok();

    match cli.command {
        Commands::Run { args, format } => {
            let resolved = build_config(&args, cli.log_level.as_deref(), env_lookup)?;
            init_tracing(resolved.log_level.as_filter_str());
            commands::run::run(&resolved.simulation, format)
        }
        Commands::Check { args } => {
            let resolved = build_config(&args, cli.log_level.as_deref(), env_lookup)?;
            init_tracing(resolved.log_level.as_filter_str());
            commands::check::run(&resolved.simulation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_heston::mc::ExecutionMode;

    #[test]
    fn test_parse_run_with_flags() {
        let cli = Cli::try_parse_from([
            "heston",
            "run",
            "--rho",
            "-0.5",
            "--n-blocks",
            "40",
            "--seed",
            "7",
            "--execution",
            "sequential",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { args, format } => {
                assert_eq!(args.rho, Some(-0.5));
                assert_eq!(args.n_blocks, Some(40));
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.execution, Some(ExecutionMode::Sequential));
                assert_eq!(args.export_paths, None);
                assert_eq!(format, OutputFormat::Json);
            }
            Commands::Check { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_check_with_config_file() {
        let cli = Cli::try_parse_from(["heston", "check", "--config", "heston.toml"]).unwrap();
        match cli.command {
            Commands::Check { args } => {
                assert_eq!(args.config, Some("heston.toml".into()));
            }
            Commands::Run { .. } => panic!("expected check"),
        }
    }

    #[test]
    fn test_run_defaults_to_table() {
        let cli = Cli::try_parse_from(["heston", "run"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run {
                format: OutputFormat::Table,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_export_paths_switch() {
        let export = |argv: &[&str]| match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run { args, .. } => args.export_paths,
            Commands::Check { .. } => panic!("expected run"),
        };

        assert_eq!(export(&["heston", "run", "--export-paths"]), Some(true));
        assert_eq!(
            export(&["heston", "run", "--export-paths", "false"]),
            Some(false)
        );
        assert_eq!(export(&["heston", "run"]), None);
    }

    #[test]
    fn test_unknown_execution_mode_rejected() {
        assert!(Cli::try_parse_from(["heston", "run", "--execution", "gpu"]).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["heston", "run", "--format", "csv"]).is_err());
    }
}
