//! Error types for the Heston Monte Carlo engine.
//!
//! [`ConfigError`] is raised before any path is simulated; [`PricingError`]
//! is the top-level error returned by the simulation entry points.
//! Per-path numeric anomalies are not errors: they are recorded as
//! [`NumericWarning`](super::diagnostics::NumericWarning)s.

use thiserror::Error;

/// Configuration error for the Heston Monte Carlo engine.
///
/// These errors occur during construction or validation of a
/// [`SimulationConfig`](super::config::SimulationConfig), before any
/// simulation work is attempted.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Correlation outside [-1, 1]; `sqrt(1 - rho^2)` would be undefined.
    #[error("Invalid correlation rho = {0}: must be in [-1, 1]")]
    InvalidCorrelation(f64),

    /// Mean-reversion rate not strictly positive.
    #[error("Invalid mean-reversion rate kappa = {0}: must be positive")]
    InvalidMeanReversion(f64),

    /// Path count outside [1, MAX_PATHS].
    #[error("Invalid path count {0}: must be in range [1, 10_000_000]")]
    InvalidPathCount(usize),

    /// Block count outside [2, MAX_BLOCKS]; the between-block sample
    /// variance needs at least two blocks.
    #[error("Invalid block count {0}: must be in range [2, 1_000_000]")]
    InvalidBlockCount(usize),

    /// Step count outside [1, MAX_STEPS].
    #[error("Invalid step count {0}: must be in range [1, 100_000]")]
    InvalidStepCount(usize),

    /// One block's path matrices would exceed `MAX_MATRIX_ENTRIES`.
    #[error(
        "Block of {n_paths} paths x {n_steps} steps too large: \
         n_paths * (n_steps + 1) must not exceed 50_000_000"
    )]
    WorkspaceTooLarge {
        /// Requested paths per block.
        n_paths: usize,
        /// Requested steps per path.
        n_steps: usize,
    },

    /// Maturity not strictly positive.
    #[error("Invalid maturity T = {0}: must be positive")]
    InvalidMaturity(f64),

    /// Initial spot not strictly positive.
    #[error("Invalid spot S0 = {0}: must be positive")]
    InvalidSpot(f64),

    /// Strike not strictly positive.
    #[error("Invalid strike K = {0}: must be positive")]
    InvalidStrike(f64),

    /// Any other invalid parameter value.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },

    /// A required parameter was never supplied to the builder.
    #[error("Missing parameter '{0}': must be specified")]
    MissingParameter(&'static str),
}

/// Top-level error of a simulation run.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum PricingError {
    /// The configuration was rejected before simulation started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cancellation request was observed between blocks.
    #[error("Simulation cancelled after {completed} of {requested} blocks")]
    Cancelled {
        /// Blocks that finished before the request was observed.
        completed: usize,
        /// Blocks requested by the configuration.
        requested: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidPathCount(0);
        assert!(err.to_string().contains("Invalid path count 0"));

        let err = ConfigError::InvalidBlockCount(1);
        assert!(err.to_string().contains("Invalid block count 1"));

        let err = ConfigError::InvalidCorrelation(1.5);
        assert!(err.to_string().contains("1.5"));

        let err = ConfigError::InvalidParameter {
            name: "epsilon",
            value: "must be non-negative, got -0.1".to_string(),
        };
        assert!(err.to_string().contains("epsilon"));

        let err = ConfigError::MissingParameter("strike");
        assert!(err.to_string().contains("strike"));
    }

    #[test]
    fn test_pricing_error_from_config() {
        let err: PricingError = ConfigError::InvalidStepCount(0).into();
        assert_eq!(err, PricingError::Config(ConfigError::InvalidStepCount(0)));
        assert!(err.to_string().contains("Invalid step count 0"));
    }

    #[test]
    fn test_cancelled_display() {
        let err = PricingError::Cancelled {
            completed: 3,
            requested: 20,
        };
        assert_eq!(err.to_string(), "Simulation cancelled after 3 of 20 blocks");
    }
}
