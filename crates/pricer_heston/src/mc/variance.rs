//! Moment-matched simulation of the Feller square-root variance process.
//!
//! Over one step of length `dt` the scheme reproduces the exact conditional
//! mean and variance of
//!
//! ```text
//! dV = kappa (theta - V) dt + epsilon sqrt(V) dW
//! ```
//!
//! with a Gaussian innovation:
//!
//! ```text
//! a      = epsilon^2 / kappa * (exp(-kappa dt) - exp(-2 kappa dt))
//! b      = theta epsilon^2 / (2 kappa) * (1 - exp(-kappa dt))^2
//! V[i+1] = theta + (V[i] - theta) exp(-kappa dt) + sqrt(max(a V[i] + b, 0)) X2[i]
//! V[i+1] = max(V[i+1], 0)
//! ```
//!
//! The final floor is a boundary policy of the discretisation, not of the
//! continuous process. It biases the variance slightly upwards; the bias
//! shrinks with `dt`. The scheme is a second-moment approximation and does
//! not reproduce the non-central chi-squared transition law.

use super::config::SimulationConfig;
use super::matrix::PathMatrix;

/// Step coefficients of the moment-matched scheme.
///
/// Depend only on `(kappa, theta, epsilon, dt)`; computed once per run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VarianceScheme {
    /// Long-run variance.
    pub theta: f64,
    /// `exp(-kappa dt)`.
    pub decay: f64,
    /// Coefficient of `V[i]` in the conditional variance.
    pub a: f64,
    /// Constant term of the conditional variance.
    pub b: f64,
}

impl VarianceScheme {
    /// Computes the scheme coefficients.
    ///
    /// `kappa` must be strictly positive (guaranteed by a validated
    /// [`SimulationConfig`]).
    pub fn new(kappa: f64, theta: f64, epsilon: f64, dt: f64) -> Self {
        let decay = (-kappa * dt).exp();
        let eps2 = epsilon * epsilon;
        let a = eps2 / kappa * (decay - (-2.0 * kappa * dt).exp());
        let b = theta * eps2 / (2.0 * kappa) * (1.0 - decay).powi(2);
        Self { theta, decay, a, b }
    }

    /// Coefficients for a validated configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.kappa(), config.theta(), config.epsilon(), config.dt())
    }

    /// Conditional mean of `V[i+1]` given `V[i] = v`.
    #[inline]
    pub fn conditional_mean(&self, v: f64) -> f64 {
        self.theta + (v - self.theta) * self.decay
    }

    /// Conditional standard deviation of `V[i+1]` given `V[i] = v`.
    ///
    /// A slightly negative `a v + b` from rounding is clamped to zero.
    #[inline]
    pub fn conditional_std(&self, v: f64) -> f64 {
        (self.a * v + self.b).max(0.0).sqrt()
    }

    /// Advances one row of paths by one step.
    ///
    /// Returns the number of entries that had to be floored at zero.
    #[inline]
    pub fn step(&self, current: &[f64], shocks: &[f64], next: &mut [f64]) -> usize {
        debug_assert_eq!(current.len(), next.len());
        debug_assert_eq!(shocks.len(), next.len());

        let mut floored = 0;
        for ((next_v, &v), &z) in next.iter_mut().zip(current).zip(shocks) {
            let candidate = self.conditional_mean(v) + self.conditional_std(v) * z;
            if candidate < 0.0 {
                floored += 1;
                *next_v = 0.0;
            } else {
                *next_v = candidate;
            }
        }
        floored
    }
}

/// Simulates the full variance path for every column of `x2`.
///
/// `variance` must be `(n_steps + 1) × n_paths` where `x2` is
/// `n_steps × n_paths`. Row 0 is set to `v0`. Steps are sequential in time;
/// each step updates a whole row of paths.
///
/// Returns the number of `(step, path)` updates that hit the zero floor.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::{simulate_variance, PathMatrix, VarianceScheme};
///
/// let scheme = VarianceScheme::new(2.0, 0.04, 0.0, 0.1);
/// let x2 = PathMatrix::zeros(5, 3);
/// let mut variance = PathMatrix::zeros(6, 3);
///
/// let floored = simulate_variance(&scheme, 0.09, &x2, &mut variance);
///
/// assert_eq!(floored, 0);
/// assert_eq!(variance.row(0), &[0.09, 0.09, 0.09]);
/// ```
pub fn simulate_variance(
    scheme: &VarianceScheme,
    v0: f64,
    x2: &PathMatrix,
    variance: &mut PathMatrix,
) -> usize {
    let n_steps = x2.n_rows();
    debug_assert_eq!(variance.n_rows(), n_steps + 1);
    debug_assert_eq!(variance.n_paths(), x2.n_paths());

    variance.row_mut(0).fill(v0);

    let mut floored = 0;
    for step in 0..n_steps {
        let (current, next) = variance.step_rows_mut(step);
        floored += scheme.step(current, x2.row(step), next);
    }
    floored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::variates::generate_variates;
    use crate::rng::PricerRng;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_scheme_coefficients() {
        let (kappa, theta, epsilon, dt) = (3.0, 0.1, 0.25, 0.005);
        let scheme = VarianceScheme::new(kappa, theta, epsilon, dt);

        let e1 = (-kappa * dt).exp();
        let e2 = (-2.0 * kappa * dt).exp();
        assert_relative_eq!(scheme.decay, e1);
        assert_relative_eq!(scheme.a, epsilon * epsilon / kappa * (e1 - e2));
        assert_relative_eq!(
            scheme.b,
            theta * epsilon * epsilon / (2.0 * kappa) * (1.0 - e1).powi(2)
        );
    }

    #[test]
    fn test_conditional_variance_matches_cir() {
        // Exact CIR conditional variance:
        // v eps^2 e^{-k dt}(1 - e^{-k dt}) / k + theta eps^2 (1 - e^{-k dt})^2 / (2k)
        let (kappa, theta, epsilon, dt, v) = (1.5, 0.04, 0.5, 0.25, 0.09);
        let scheme = VarianceScheme::new(kappa, theta, epsilon, dt);
        let e = (-kappa * dt).exp();
        let exact = v * epsilon * epsilon * e * (1.0 - e) / kappa
            + theta * epsilon * epsilon * (1.0 - e).powi(2) / (2.0 * kappa);

        assert_relative_eq!(scheme.conditional_std(v).powi(2), exact, epsilon = 1e-14);
    }

    #[test]
    fn test_negative_radicand_clamped() {
        let scheme = VarianceScheme {
            theta: 0.0,
            decay: 1.0,
            a: 1.0,
            b: -1e-18,
        };
        assert_eq!(scheme.conditional_std(0.0), 0.0);
    }

    #[test]
    fn test_zero_vol_of_vol_is_deterministic() {
        let (kappa, theta, v0, maturity, n_steps) = (3.0, 0.1, 0.08, 1.0, 50);
        let dt = maturity / n_steps as f64;
        let scheme = VarianceScheme::new(kappa, theta, 0.0, dt);

        let mut rng = PricerRng::from_seed(42);
        let pair = generate_variates(&mut rng, n_steps, 16, -0.8).unwrap();
        let mut variance = PathMatrix::zeros(n_steps + 1, 16);

        let floored = simulate_variance(&scheme, v0, &pair.x2, &mut variance);
        assert_eq!(floored, 0);

        for step in 0..=n_steps {
            let expected = theta + (v0 - theta) * (-kappa * step as f64 * dt).exp();
            for &v in variance.row(step) {
                assert_relative_eq!(v, expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_floor_counts_and_non_negativity() {
        // Feller condition badly violated: 2 * 0.5 * 0.01 << 1.0
        let scheme = VarianceScheme::new(0.5, 0.01, 1.0, 0.1);
        let mut rng = PricerRng::from_seed(3);
        let pair = generate_variates(&mut rng, 50, 500, 0.0).unwrap();
        let mut variance = PathMatrix::zeros(51, 500);

        let floored = simulate_variance(&scheme, 0.01, &pair.x2, &mut variance);

        assert!(floored > 0);
        let zeros = variance.as_slice()[500..].iter().filter(|&&v| v == 0.0).count();
        assert_eq!(zeros, floored);
        assert!(variance.as_slice().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_single_step_recurrence() {
        let scheme = VarianceScheme::new(2.0, 0.04, 0.3, 0.5);
        let mut x2 = PathMatrix::zeros(1, 2);
        x2.row_mut(0).copy_from_slice(&[0.5, -0.25]);
        let mut variance = PathMatrix::zeros(2, 2);

        simulate_variance(&scheme, 0.05, &x2, &mut variance);

        for (path, &z) in [0.5, -0.25].iter().enumerate() {
            let expected = (0.04 + (0.05 - 0.04) * scheme.decay
                + (scheme.a * 0.05 + scheme.b).sqrt() * z)
                .max(0.0);
            assert_relative_eq!(variance.get(1, path), expected);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_variance_never_negative(
            kappa in 0.01f64..10.0,
            theta in 0.0f64..1.0,
            epsilon in 0.0f64..3.0,
            v0 in 0.0f64..1.0,
            rho in -1.0f64..=1.0,
            n_steps in 1usize..40,
            seed in any::<u64>(),
        ) {
            let dt = 1.0 / n_steps as f64;
            let scheme = VarianceScheme::new(kappa, theta, epsilon, dt);
            let mut rng = PricerRng::from_seed(seed);
            let pair = generate_variates(&mut rng, n_steps, 32, rho).unwrap();
            let mut variance = PathMatrix::zeros(n_steps + 1, 32);

            simulate_variance(&scheme, v0, &pair.x2, &mut variance);

            prop_assert!(variance.as_slice().iter().all(|&v| v >= 0.0 && v.is_finite()));
        }
    }
}
