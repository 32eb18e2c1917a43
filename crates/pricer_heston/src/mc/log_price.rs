//! Log-price integration driven by a simulated variance path.
//!
//! With `X = ln(S / S0)` and the variance path already simulated, each step
//! adds
//!
//! ```text
//! dX[i] = (mu - 0.5 V[i]) dt + sqrt(V[i]) X1[i] sqrt(dt)
//! ```
//!
//! so `X[0] = 0` and `X[k]` is the prefix sum of the first `k` increments.
//! The variance path is floored at zero upstream, so `sqrt(V[i])` is always
//! defined.
//!
//! Two entry points share the same increment and summation order and are
//! therefore bit-identical on the terminal row: [`accumulate_log_returns`]
//! keeps only a running accumulator per path, while
//! [`integrate_log_price_path`] materialises every time index.

use super::config::SimulationConfig;
use super::matrix::PathMatrix;

/// Per-step constants of the log-price recurrence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogPriceIntegrator {
    mu: f64,
    dt: f64,
    sqrt_dt: f64,
}

impl LogPriceIntegrator {
    /// Integrator for drift `mu = r - q` and step `dt`.
    pub fn new(mu: f64, dt: f64) -> Self {
        Self {
            mu,
            dt,
            sqrt_dt: dt.sqrt(),
        }
    }

    /// Integrator for a validated configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.mu(), config.dt())
    }

    /// Log-return over one step given the variance at the start of the
    /// step and the price shock.
    #[inline]
    pub fn increment(&self, v: f64, z: f64) -> f64 {
        (self.mu - 0.5 * v) * self.dt + v.sqrt() * z * self.sqrt_dt
    }
}

/// Accumulates terminal log returns `X[nsteps]` for every path.
///
/// `variance` is `(n_steps + 1) × n_paths`; only rows `0..n_steps` are read.
/// `x1` is `n_steps × n_paths`. `log_returns` has length `n_paths` and is
/// overwritten.
pub fn accumulate_log_returns(
    integrator: &LogPriceIntegrator,
    variance: &PathMatrix,
    x1: &PathMatrix,
    log_returns: &mut [f64],
) {
    debug_assert_eq!(variance.n_rows(), x1.n_rows() + 1);
    debug_assert_eq!(log_returns.len(), x1.n_paths());

    log_returns.fill(0.0);
    for step in 0..x1.n_rows() {
        for ((x, &v), &z) in log_returns
            .iter_mut()
            .zip(variance.row(step))
            .zip(x1.row(step))
        {
            *x += integrator.increment(v, z);
        }
    }
}

/// Materialises the full log-price path `X`, `(n_steps + 1) × n_paths`,
/// with row 0 identically zero.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::{integrate_log_price_path, LogPriceIntegrator, PathMatrix};
///
/// let integrator = LogPriceIntegrator::new(0.05, 0.5);
/// let mut variance = PathMatrix::zeros(3, 1);
/// variance.as_mut_slice().fill(0.04);
/// let x1 = PathMatrix::zeros(2, 1);
/// let mut path = PathMatrix::zeros(3, 1);
///
/// integrate_log_price_path(&integrator, &variance, &x1, &mut path);
///
/// // No shocks: X grows by (mu - V/2) dt per step
/// assert!((path.get(2, 0) - 2.0 * (0.05 - 0.02) * 0.5).abs() < 1e-15);
/// ```
pub fn integrate_log_price_path(
    integrator: &LogPriceIntegrator,
    variance: &PathMatrix,
    x1: &PathMatrix,
    path: &mut PathMatrix,
) {
    debug_assert_eq!(variance.n_rows(), x1.n_rows() + 1);
    debug_assert_eq!(path.n_rows(), x1.n_rows() + 1);

    path.row_mut(0).fill(0.0);
    for step in 0..x1.n_rows() {
        let (current, next) = path.step_rows_mut(step);
        for (((x_next, &x), &v), &z) in next
            .iter_mut()
            .zip(current)
            .zip(variance.row(step))
            .zip(x1.row(step))
        {
            *x_next = x + integrator.increment(v, z);
        }
    }
}

/// Converts terminal log returns into terminal prices `S0 exp(X)`.
///
/// Overflow is not trapped here: an extreme log return yields `inf`, which
/// the payoff stage counts and excludes.
pub fn terminal_prices(spot: f64, log_returns: &[f64], prices: &mut [f64]) {
    debug_assert_eq!(log_returns.len(), prices.len());
    for (s, &x) in prices.iter_mut().zip(log_returns) {
        *s = spot * x.exp();
    }
}
