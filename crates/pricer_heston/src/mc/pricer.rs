//! Block-parallel Heston Monte Carlo pricer.
//!
//! For each of `nblocks` independent blocks:
//!
//! ```text
//! variates -> variance path -> log-price -> terminal prices -> (call, put)
//! ```
//!
//! and the block estimates are reduced by [`aggregate_blocks`]. Block `b`
//! draws from `derive_block_seed(master, b)` only, so the result does not
//! depend on which thread ran which block or in what order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::config::{ExecutionMode, SimulationConfig};
use super::diagnostics::SimulationDiagnostics;
use super::error::{ConfigError, PricingError};
use super::log_price::{
    accumulate_log_returns, integrate_log_price_path, terminal_prices, LogPriceIntegrator,
};
use super::matrix::PathMatrix;
use super::payoff::{block_payoff, BlockEstimate};
use super::stats::{aggregate_blocks, AggregateResult};
use super::variance::{simulate_variance, VarianceScheme};
use super::workspace::BlockWorkspace;
use crate::rng::{derive_block_seed, entropy_seed, PricerRng};

/// Cooperative cancellation flag shared between a caller and a running
/// simulation.
///
/// Checked before each block starts; blocks already running complete.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::{simulate_with_cancellation, CancellationToken, PricingError};
/// use pricer_heston::mc::SimulationConfigBuilder;
///
/// let config = SimulationConfigBuilder::sample().n_paths(10).n_steps(2).seed(1).build().unwrap();
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let result = simulate_with_cancellation(&config, &token);
/// assert!(matches!(result, Err(PricingError::Cancelled { completed: 0, .. })));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Diagnostic export of one block's simulated paths.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathExport {
    /// Index of the exported block (always the last one).
    pub block_index: usize,
    /// Variance path, `(nsteps + 1) × npaths`.
    pub variance: PathMatrix,
    /// Log-price path `ln(S / S0)`, `(nsteps + 1) × npaths`.
    pub log_price: PathMatrix,
    /// Terminal prices `S0 exp(X[nsteps])`.
    pub terminal_prices: Vec<f64>,
}

/// Everything a run produces.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResult {
    /// Prices and standard errors.
    pub aggregate: AggregateResult,
    /// Per-block estimates in block order.
    pub block_estimates: Vec<BlockEstimate>,
    /// Master seed actually used; replaying it reproduces the run.
    pub seed: u64,
    /// Clamping/overflow counters and warnings.
    pub diagnostics: SimulationDiagnostics,
    /// Paths of the last block, when requested.
    pub paths: Option<PathExport>,
}

/// What one block hands to the reduction.
#[derive(Debug)]
struct BlockOutcome {
    estimate: BlockEstimate,
    clamped: usize,
    non_finite: usize,
    export: Option<PathExport>,
}

/// Heston Monte Carlo pricer for European calls and puts.
///
/// Holds a validated configuration and the step coefficients derived from
/// it. Simulation borrows the pricer immutably, so one pricer may be shared
/// across threads.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::{HestonPricer, SimulationConfigBuilder};
///
/// let config = SimulationConfigBuilder::sample()
///     .n_paths(1_000)
///     .n_blocks(4)
///     .n_steps(50)
///     .seed(42)
///     .build()
///     .unwrap();
///
/// let pricer = HestonPricer::new(config).unwrap();
/// let result = pricer.simulate().unwrap();
///
/// assert_eq!(result.block_estimates.len(), 4);
/// assert!(result.aggregate.put_price > result.aggregate.call_price);
/// ```
#[derive(Clone, Debug)]
pub struct HestonPricer {
    config: SimulationConfig,
    scheme: VarianceScheme,
    integrator: LogPriceIntegrator,
}

impl HestonPricer {
    /// Creates a pricer, re-validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let scheme = VarianceScheme::from_config(&config);
        let integrator = LogPriceIntegrator::from_config(&config);
        Ok(Self {
            config,
            scheme,
            integrator,
        })
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs all blocks and aggregates them.
    ///
    /// # Errors
    ///
    /// See [`simulate_with_cancellation`](Self::simulate_with_cancellation).
    pub fn simulate(&self) -> Result<SimulationResult, PricingError> {
        self.simulate_with_cancellation(&CancellationToken::new())
    }

    /// Runs all blocks, checking `cancel` before each one.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Cancelled`] if cancellation was observed
    /// before every block had started.
    #[tracing::instrument(
        name = "heston_simulate",
        skip_all,
        fields(
            n_blocks = self.config.n_blocks(),
            n_paths = self.config.n_paths(),
            n_steps = self.config.n_steps()
        )
    )]
    pub fn simulate_with_cancellation(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SimulationResult, PricingError> {
        let config = &self.config;
        let seed = config.seed().unwrap_or_else(entropy_seed);
        let n_blocks = config.n_blocks();

        tracing::info!(
            seed,
            execution = ?config.execution(),
            feller = config.satisfies_feller(),
            "starting Heston simulation"
        );

        let new_workspace = || BlockWorkspace::new(config.n_paths(), config.n_steps());
        let outcomes: Vec<Option<BlockOutcome>> = match config.execution() {
            ExecutionMode::Parallel => (0..n_blocks)
                .into_par_iter()
                .map_init(new_workspace, |ws, block| {
                    self.run_block_unless_cancelled(ws, seed, block, cancel)
                })
                .collect::<Result<Vec<_>, ConfigError>>()?,
            ExecutionMode::Sequential => {
                let mut ws = new_workspace();
                (0..n_blocks)
                    .map(|block| self.run_block_unless_cancelled(&mut ws, seed, block, cancel))
                    .collect::<Result<Vec<_>, ConfigError>>()?
            }
        };

        self.summarise(seed, outcomes)
    }

    /// Reduces per-block outcomes into a result; any missing block means
    /// the run was cancelled.
    fn summarise(
        &self,
        seed: u64,
        outcomes: Vec<Option<BlockOutcome>>,
    ) -> Result<SimulationResult, PricingError> {
        let config = &self.config;
        let n_blocks = config.n_blocks();
        let completed = outcomes.iter().filter(|o| o.is_some()).count();
        if completed < n_blocks {
            tracing::info!(completed, requested = n_blocks, "simulation cancelled");
            return Err(PricingError::Cancelled {
                completed,
                requested: n_blocks,
            });
        }

        let mut diagnostics = SimulationDiagnostics {
            total_updates: n_blocks as u64 * config.n_steps() as u64 * config.n_paths() as u64,
            feller_satisfied: config.satisfies_feller(),
            ..SimulationDiagnostics::default()
        };
        let mut block_estimates = Vec::with_capacity(n_blocks);
        let mut paths = None;
        for outcome in outcomes.into_iter().flatten() {
            diagnostics.clamped_updates += outcome.clamped as u64;
            diagnostics.non_finite_terminals += outcome.non_finite as u64;
            block_estimates.push(outcome.estimate);
            if outcome.export.is_some() {
                paths = outcome.export;
            }
        }
        diagnostics.raise_warnings(config.clamp_warning_threshold());

        let aggregate = aggregate_blocks(&block_estimates)?;

        tracing::info!(
            call_price = aggregate.call_price,
            call_stderr = aggregate.call_stderr,
            put_price = aggregate.put_price,
            put_stderr = aggregate.put_stderr,
            clamp_ratio = diagnostics.clamp_ratio(),
            "Heston simulation complete"
        );

        Ok(SimulationResult {
            aggregate,
            block_estimates,
            seed,
            diagnostics,
            paths,
        })
    }

    fn run_block_unless_cancelled(
        &self,
        ws: &mut BlockWorkspace,
        master_seed: u64,
        block: usize,
        cancel: &CancellationToken,
    ) -> Result<Option<BlockOutcome>, ConfigError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        self.run_block(ws, master_seed, block).map(Some)
    }

    /// Simulates block `block` into `ws` and prices it.
    fn run_block(
        &self,
        ws: &mut BlockWorkspace,
        master_seed: u64,
        block: usize,
    ) -> Result<BlockOutcome, ConfigError> {
        let config = &self.config;
        let block_seed = derive_block_seed(master_seed, block);
        let mut rng = PricerRng::from_seed(block_seed);

        ws.variates.fill(&mut rng, config.rho())?;
        let clamped = simulate_variance(&self.scheme, config.v0(), &ws.variates.x2, &mut ws.variance);

        let export_block = config.export_paths() && block + 1 == config.n_blocks();
        let log_price = if export_block {
            let mut path = PathMatrix::zeros(config.n_steps() + 1, config.n_paths());
            integrate_log_price_path(&self.integrator, &ws.variance, &ws.variates.x1, &mut path);
            ws.log_returns.copy_from_slice(path.last_row());
            Some(path)
        } else {
            accumulate_log_returns(
                &self.integrator,
                &ws.variance,
                &ws.variates.x1,
                &mut ws.log_returns,
            );
            None
        };
        terminal_prices(config.spot(), &ws.log_returns, &mut ws.terminal);

        let payoff = block_payoff(&ws.terminal, config.strike(), config.discount_factor());

        tracing::debug!(
            block,
            block_seed,
            call = payoff.estimate.call,
            put = payoff.estimate.put,
            clamped,
            non_finite = payoff.non_finite,
            "block complete"
        );

        let export = log_price.map(|log_price| PathExport {
            block_index: block,
            variance: ws.variance.clone(),
            log_price,
            terminal_prices: ws.terminal.clone(),
        });

        Ok(BlockOutcome {
            estimate: payoff.estimate,
            clamped,
            non_finite: payoff.non_finite,
            export,
        })
    }
}

/// Prices a European call and put under `config`.
///
/// Convenience wrapper around [`HestonPricer::simulate`].
///
/// # Errors
///
/// Returns [`PricingError::Config`] if the configuration is invalid.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationResult, PricingError> {
    HestonPricer::new(config.clone())?.simulate()
}

/// [`simulate`] with cooperative cancellation between blocks.
///
/// # Errors
///
/// Returns [`PricingError::Config`] if the configuration is invalid and
/// [`PricingError::Cancelled`] if `cancel` fired before every block started.
pub fn simulate_with_cancellation(
    config: &SimulationConfig,
    cancel: &CancellationToken,
) -> Result<SimulationResult, PricingError> {
    HestonPricer::new(config.clone())?.simulate_with_cancellation(cancel)
}
