//! Correlated standard-normal variate generation.
//!
//! Each block draws two `nsteps × npaths` matrices `X1`, `X2` such that every
//! entry of `X1` is an independent standard normal and
//!
//! ```text
//! X2[i, j] = rho * X1[i, j] + sqrt(1 - rho^2) * Z[i, j]
//! ```
//!
//! with `Z` an independent standard-normal matrix. `X1` drives the log price
//! and `X2` drives the variance process.

use super::error::ConfigError;
use super::matrix::PathMatrix;
use crate::rng::PricerRng;

/// The pair of variate matrices consumed by one block.
#[derive(Clone, Debug, PartialEq)]
pub struct VariatePair {
    /// Price driver, independent standard normals.
    pub x1: PathMatrix,
    /// Variance driver, correlated with `x1` entry by entry.
    pub x2: PathMatrix,
}

impl VariatePair {
    /// Zero-filled pair of `n_steps × n_paths` matrices.
    pub fn zeros(n_steps: usize, n_paths: usize) -> Self {
        Self {
            x1: PathMatrix::zeros(n_steps, n_paths),
            x2: PathMatrix::zeros(n_steps, n_paths),
        }
    }

    /// Fills both matrices in place with fresh correlated draws.
    ///
    /// All of `X1` is drawn first, then all of `Z`, so the result depends
    /// only on the generator state and the shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCorrelation`] if `|rho| > 1`.
    pub fn fill(&mut self, rng: &mut PricerRng, rho: f64) -> Result<(), ConfigError> {
        let complement = correlation_complement(rho)?;

        rng.fill_normal(self.x1.as_mut_slice());
        rng.fill_normal(self.x2.as_mut_slice());

        for (x2, &x1) in self
            .x2
            .as_mut_slice()
            .iter_mut()
            .zip(self.x1.as_slice().iter())
        {
            *x2 = rho * x1 + complement * *x2;
        }
        Ok(())
    }
}

/// Draws a fresh [`VariatePair`] of shape `n_steps × n_paths`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCorrelation`] if `|rho| > 1`.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::generate_variates;
/// use pricer_heston::rng::PricerRng;
///
/// let mut rng = PricerRng::from_seed(42);
/// let pair = generate_variates(&mut rng, 10, 100, -0.5).unwrap();
///
/// assert_eq!(pair.x1.n_rows(), 10);
/// assert_eq!(pair.x2.n_paths(), 100);
/// assert!(generate_variates(&mut rng, 10, 100, 1.5).is_err());
/// ```
pub fn generate_variates(
    rng: &mut PricerRng,
    n_steps: usize,
    n_paths: usize,
    rho: f64,
) -> Result<VariatePair, ConfigError> {
    let mut pair = VariatePair::zeros(n_steps, n_paths);
    pair.fill(rng, rho)?;
    Ok(pair)
}

/// `sqrt(1 - rho^2)`, rejecting correlations outside [-1, 1].
#[inline]
fn correlation_complement(rho: f64) -> Result<f64, ConfigError> {
    if rho.is_nan() || rho.abs() > 1.0 {
        return Err(ConfigError::InvalidCorrelation(rho));
    }
    Ok((1.0 - rho * rho).max(0.0).sqrt())
}
