//! Heston Monte Carlo simulation configuration.
//!
//! This module provides [`SimulationConfig`], the immutable description of
//! one pricing run (model parameters, contract, discretisation and engine
//! knobs), and its builder. A configuration is validated once, at build
//! time; every component downstream reads it by shared reference.

use super::error::ConfigError;

/// Maximum number of paths per block.
pub const MAX_PATHS: usize = 10_000_000;

/// Maximum number of time steps per path.
pub const MAX_STEPS: usize = 100_000;

/// Maximum entries of one `(n_steps + 1) × n_paths` path matrix.
///
/// A worker holds three matrices of roughly this size (two variate
/// matrices and the variance path), so peak memory in parallel mode is
/// about `3 × 8 × MAX_MATRIX_ENTRIES` bytes per rayon worker thread.
pub const MAX_MATRIX_ENTRIES: usize = 50_000_000;

/// Maximum number of independent blocks.
pub const MAX_BLOCKS: usize = 1_000_000;

/// Minimum number of blocks (the between-block sample variance needs two).
pub const MIN_BLOCKS: usize = 2;

/// Default fraction of floored variance updates tolerated before a
/// numeric-instability warning is recorded.
pub const DEFAULT_CLAMP_WARNING_THRESHOLD: f64 = 0.05;

/// How independent blocks are scheduled.
///
/// Both modes give bit-identical results for the same seed, since every
/// block draws from its own derived stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExecutionMode {
    /// Blocks run on the rayon thread pool.
    #[default]
    Parallel,
    /// Blocks run one after another on the calling thread.
    Sequential,
}

impl std::str::FromStr for ExecutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parallel" => Ok(ExecutionMode::Parallel),
            "sequential" => Ok(ExecutionMode::Sequential),
            _ => Err(ConfigError::InvalidParameter {
                name: "execution",
                value: format!("must be 'parallel' or 'sequential', got '{}'", s),
            }),
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Parallel => write!(f, "parallel"),
            ExecutionMode::Sequential => write!(f, "sequential"),
        }
    }
}

/// Heston Monte Carlo simulation configuration.
///
/// Immutable once built. Use [`SimulationConfig::builder`] to construct
/// instances.
///
/// # Model
///
/// ```text
/// dV = kappa (theta - V) dt + epsilon sqrt(V) dW_V
/// dX = (r - q - V/2) dt + sqrt(V) dW_S,     X = ln(S / S0)
/// d<W_S, W_V> = rho dt
/// ```
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::SimulationConfig;
///
/// let config = SimulationConfig::builder()
///     .kappa(3.0)
///     .theta(0.1)
///     .epsilon(0.25)
///     .v0(0.08)
///     .rho(-0.8)
///     .spot(1.0)
///     .strike(1.1)
///     .rate(0.02)
///     .maturity(1.0)
///     .n_paths(10_000)
///     .n_blocks(20)
///     .n_steps(200)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.dt(), 1.0 / 200.0);
/// assert!(config.satisfies_feller());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SimulationConfig {
    kappa: f64,
    theta: f64,
    epsilon: f64,
    v0: f64,
    rho: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    maturity: f64,
    n_paths: usize,
    n_blocks: usize,
    n_steps: usize,
    seed: Option<u64>,
    execution: ExecutionMode,
    clamp_warning_threshold: f64,
    export_paths: bool,
}

impl SimulationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Mean-reversion rate (kappa).
    #[inline]
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Long-run variance (theta).
    #[inline]
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Volatility of variance (epsilon).
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Initial variance (V0).
    #[inline]
    pub fn v0(&self) -> f64 {
        self.v0
    }

    /// Correlation between the price and variance drivers (rho).
    #[inline]
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Initial spot (S0).
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Option strike (K).
    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Continuously compounded risk-free rate (r).
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Continuous dividend yield (q).
    #[inline]
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Maturity in years (T).
    #[inline]
    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    /// Paths simulated per block.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Number of independent blocks.
    #[inline]
    pub fn n_blocks(&self) -> usize {
        self.n_blocks
    }

    /// Number of time steps per path.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Optional master seed.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Block scheduling mode.
    #[inline]
    pub fn execution(&self) -> ExecutionMode {
        self.execution
    }

    /// Floored-update fraction above which a warning is recorded.
    #[inline]
    pub fn clamp_warning_threshold(&self) -> f64 {
        self.clamp_warning_threshold
    }

    /// Whether the final block's paths are exported with the result.
    #[inline]
    pub fn export_paths(&self) -> bool {
        self.export_paths
    }

    /// Time step `T / nsteps`.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.maturity / self.n_steps as f64
    }

    /// Risk-neutral drift of the log price, `r - q`.
    #[inline]
    pub fn mu(&self) -> f64 {
        self.rate - self.dividend_yield
    }

    /// Discount factor `exp(-r T)`.
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.maturity).exp()
    }

    /// Returns `true` when the Feller condition `2 kappa theta >= epsilon^2`
    /// holds, i.e. the continuous variance process stays away from zero.
    #[inline]
    pub fn satisfies_feller(&self) -> bool {
        2.0 * self.kappa * self.theta >= self.epsilon * self.epsilon
    }

    /// Returns a copy with a different master seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self.clone()
        }
    }

    /// Returns a copy with a different block count, re-validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBlockCount`] for counts outside
    /// `[2, MAX_BLOCKS]`.
    pub fn with_blocks(&self, n_blocks: usize) -> Result<Self, ConfigError> {
        let config = Self {
            n_blocks,
            ..self.clone()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `|rho| > 1`
    /// - `kappa <= 0`
    /// - `n_paths`, `n_steps` are 0 or above their maximum
    /// - `n_blocks < 2` or above its maximum
    /// - `n_paths × (n_steps + 1)` exceeds [`MAX_MATRIX_ENTRIES`]
    /// - `T <= 0`, `S0 <= 0` or `K <= 0`
    /// - `theta`, `epsilon` or `V0` is negative
    /// - any float parameter is not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rho.is_nan() || self.rho.abs() > 1.0 {
            return Err(ConfigError::InvalidCorrelation(self.rho));
        }
        if !is_positive(self.kappa) {
            return Err(ConfigError::InvalidMeanReversion(self.kappa));
        }
        if self.n_paths == 0 || self.n_paths > MAX_PATHS {
            return Err(ConfigError::InvalidPathCount(self.n_paths));
        }
        if self.n_blocks < MIN_BLOCKS || self.n_blocks > MAX_BLOCKS {
            return Err(ConfigError::InvalidBlockCount(self.n_blocks));
        }
        if self.n_steps == 0 || self.n_steps > MAX_STEPS {
            return Err(ConfigError::InvalidStepCount(self.n_steps));
        }
        if self.n_paths.saturating_mul(self.n_steps + 1) > MAX_MATRIX_ENTRIES {
            return Err(ConfigError::WorkspaceTooLarge {
                n_paths: self.n_paths,
                n_steps: self.n_steps,
            });
        }
        if !is_positive(self.maturity) {
            return Err(ConfigError::InvalidMaturity(self.maturity));
        }
        if !is_positive(self.spot) {
            return Err(ConfigError::InvalidSpot(self.spot));
        }
        if !is_positive(self.strike) {
            return Err(ConfigError::InvalidStrike(self.strike));
        }
        check_non_negative("theta", self.theta)?;
        check_non_negative("epsilon", self.epsilon)?;
        check_non_negative("v0", self.v0)?;
        check_finite("rate", self.rate)?;
        check_finite("dividend_yield", self.dividend_yield)?;
        if !is_positive(self.clamp_warning_threshold) || self.clamp_warning_threshold > 1.0 {
            return Err(ConfigError::InvalidParameter {
                name: "clamp_warning_threshold",
                value: format!("must be in (0, 1], got {}", self.clamp_warning_threshold),
            });
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value: format!("must be finite and non-negative, got {}", value),
        })
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value: format!("must be finite, got {}", value),
        })
    }
}

/// Builder for [`SimulationConfig`].
///
/// Every model, contract and sample-size parameter is required; the
/// dividend yield defaults to zero and the seed to `None`.
///
/// With the `serde` feature the builder deserialises from partial
/// documents (all fields optional), which is how file-based configuration
/// is layered before validation.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SimulationConfigBuilder {
    kappa: Option<f64>,
    theta: Option<f64>,
    epsilon: Option<f64>,
    v0: Option<f64>,
    rho: Option<f64>,
    spot: Option<f64>,
    strike: Option<f64>,
    rate: Option<f64>,
    dividend_yield: Option<f64>,
    maturity: Option<f64>,
    n_paths: Option<usize>,
    n_blocks: Option<usize>,
    n_steps: Option<usize>,
    seed: Option<u64>,
    execution: Option<ExecutionMode>,
    clamp_warning_threshold: Option<f64>,
    export_paths: Option<bool>,
}

impl SimulationConfigBuilder {
    /// Builder pre-filled with the reference parameter set:
    /// `kappa=3, theta=0.1, epsilon=0.25, V0=0.08, rho=-0.8, S0=1, K=1.1,
    /// r=0.02, q=0, T=1, nsteps=200, npaths=10000, nblocks=20`.
    pub fn sample() -> Self {
        Self::default()
            .kappa(3.0)
            .theta(0.1)
            .epsilon(0.25)
            .v0(0.08)
            .rho(-0.8)
            .spot(1.0)
            .strike(1.1)
            .rate(0.02)
            .dividend_yield(0.0)
            .maturity(1.0)
            .n_steps(200)
            .n_paths(10_000)
            .n_blocks(20)
    }

    /// Sets the mean-reversion rate.
    #[inline]
    pub fn kappa(mut self, kappa: f64) -> Self {
        self.kappa = Some(kappa);
        self
    }

    /// Sets the long-run variance.
    #[inline]
    pub fn theta(mut self, theta: f64) -> Self {
        self.theta = Some(theta);
        self
    }

    /// Sets the volatility of variance.
    #[inline]
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Sets the initial variance.
    #[inline]
    pub fn v0(mut self, v0: f64) -> Self {
        self.v0 = Some(v0);
        self
    }

    /// Sets the price/variance correlation.
    #[inline]
    pub fn rho(mut self, rho: f64) -> Self {
        self.rho = Some(rho);
        self
    }

    /// Sets the initial spot.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets the strike.
    #[inline]
    pub fn strike(mut self, strike: f64) -> Self {
        self.strike = Some(strike);
        self
    }

    /// Sets the risk-free rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Sets the dividend yield (default 0).
    #[inline]
    pub fn dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }

    /// Sets the maturity in years.
    #[inline]
    pub fn maturity(mut self, maturity: f64) -> Self {
        self.maturity = Some(maturity);
        self
    }

    /// Sets the number of paths per block.
    #[inline]
    pub fn n_paths(mut self, n_paths: usize) -> Self {
        self.n_paths = Some(n_paths);
        self
    }

    /// Sets the number of independent blocks.
    #[inline]
    pub fn n_blocks(mut self, n_blocks: usize) -> Self {
        self.n_blocks = Some(n_blocks);
        self
    }

    /// Sets the number of time steps.
    #[inline]
    pub fn n_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = Some(n_steps);
        self
    }

    /// Sets the master seed for reproducibility.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the block scheduling mode.
    #[inline]
    pub fn execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = Some(execution);
        self
    }

    /// Sets the floored-update fraction that triggers a warning.
    #[inline]
    pub fn clamp_warning_threshold(mut self, threshold: f64) -> Self {
        self.clamp_warning_threshold = Some(threshold);
        self
    }

    /// Requests the diagnostic path export.
    #[inline]
    pub fn export_paths(mut self, export_paths: bool) -> Self {
        self.export_paths = Some(export_paths);
        self
    }

    /// Overlays `other` on `self`: every parameter set in `other` wins.
    ///
    /// Used to layer configuration sources of increasing priority.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pricer_heston::mc::SimulationConfigBuilder;
    ///
    /// let layered = SimulationConfigBuilder::sample()
    ///     .merge(SimulationConfigBuilder::default().strike(1.0))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(layered.strike(), 1.0);
    /// assert_eq!(layered.spot(), 1.0);
    /// ```
    pub fn merge(self, other: SimulationConfigBuilder) -> Self {
        Self {
            kappa: other.kappa.or(self.kappa),
            theta: other.theta.or(self.theta),
            epsilon: other.epsilon.or(self.epsilon),
            v0: other.v0.or(self.v0),
            rho: other.rho.or(self.rho),
            spot: other.spot.or(self.spot),
            strike: other.strike.or(self.strike),
            rate: other.rate.or(self.rate),
            dividend_yield: other.dividend_yield.or(self.dividend_yield),
            maturity: other.maturity.or(self.maturity),
            n_paths: other.n_paths.or(self.n_paths),
            n_blocks: other.n_blocks.or(self.n_blocks),
            n_steps: other.n_steps.or(self.n_steps),
            seed: other.seed.or(self.seed),
            execution: other.execution.or(self.execution),
            clamp_warning_threshold: other.clamp_warning_threshold.or(self.clamp_warning_threshold),
            export_paths: other.export_paths.or(self.export_paths),
        }
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingParameter`] for any unset required
    /// parameter, otherwise the first failure of
    /// [`SimulationConfig::validate`].
    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let config = SimulationConfig {
            kappa: self.kappa.ok_or(ConfigError::MissingParameter("kappa"))?,
            theta: self.theta.ok_or(ConfigError::MissingParameter("theta"))?,
            epsilon: self.epsilon.ok_or(ConfigError::MissingParameter("epsilon"))?,
            v0: self.v0.ok_or(ConfigError::MissingParameter("v0"))?,
            rho: self.rho.ok_or(ConfigError::MissingParameter("rho"))?,
            spot: self.spot.ok_or(ConfigError::MissingParameter("spot"))?,
            strike: self.strike.ok_or(ConfigError::MissingParameter("strike"))?,
            rate: self.rate.ok_or(ConfigError::MissingParameter("rate"))?,
            dividend_yield: self.dividend_yield.unwrap_or(0.0),
            maturity: self.maturity.ok_or(ConfigError::MissingParameter("maturity"))?,
            n_paths: self.n_paths.ok_or(ConfigError::MissingParameter("n_paths"))?,
            n_blocks: self.n_blocks.ok_or(ConfigError::MissingParameter("n_blocks"))?,
            n_steps: self.n_steps.ok_or(ConfigError::MissingParameter("n_steps"))?,
            seed: self.seed,
            execution: self.execution.unwrap_or_default(),
            clamp_warning_threshold: self
                .clamp_warning_threshold
                .unwrap_or(DEFAULT_CLAMP_WARNING_THRESHOLD),
            export_paths: self.export_paths.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}
