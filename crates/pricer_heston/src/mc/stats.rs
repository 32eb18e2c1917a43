//! Batched-means reduction of block estimates.
//!
//! Each block is one i.i.d. sample of the Monte Carlo estimator, so the
//! standard error of the overall mean is estimated from the between-block
//! sample variance:
//!
//! ```text
//! price  = mean(block estimates)
//! stderr = sqrt(sample_variance(block estimates) / nblocks)
//! ```

use super::config::{SimulationConfig, MIN_BLOCKS};
use super::error::ConfigError;
use super::payoff::BlockEstimate;

/// A price estimate with its standard error.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceEstimate {
    /// Point estimate.
    pub price: f64,
    /// Standard error of the point estimate.
    pub std_error: f64,
}

impl PriceEstimate {
    /// Returns the 95% confidence interval half-width.
    #[inline]
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.std_error
    }

    /// Returns the 99% confidence interval half-width.
    #[inline]
    pub fn confidence_99(&self) -> f64 {
        2.576 * self.std_error
    }

    /// Normal-approximation interval `price ± z * std_error`.
    #[inline]
    pub fn interval(&self, z: f64) -> (f64, f64) {
        let half = z * self.std_error;
        (self.price - half, self.price + half)
    }
}

/// Final call/put prices and standard errors across all blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateResult {
    /// Mean of the block call estimates.
    pub call_price: f64,
    /// Mean of the block put estimates.
    pub put_price: f64,
    /// Standard error of `call_price`.
    pub call_stderr: f64,
    /// Standard error of `put_price`.
    pub put_stderr: f64,
}

impl AggregateResult {
    /// Call price with its standard error.
    #[inline]
    pub fn call(&self) -> PriceEstimate {
        PriceEstimate {
            price: self.call_price,
            std_error: self.call_stderr,
        }
    }

    /// Put price with its standard error.
    #[inline]
    pub fn put(&self) -> PriceEstimate {
        PriceEstimate {
            price: self.put_price,
            std_error: self.put_stderr,
        }
    }

    /// Deviation from put-call parity,
    /// `(C - P) - (S0 exp(-qT) - K exp(-rT))`.
    pub fn parity_gap(&self, config: &SimulationConfig) -> f64 {
        let forward_leg = config.spot() * (-config.dividend_yield() * config.maturity()).exp();
        let strike_leg = config.strike() * config.discount_factor();
        (self.call_price - self.put_price) - (forward_leg - strike_leg)
    }

    /// Scale against which [`parity_gap`](Self::parity_gap) is judged:
    /// `call_stderr + put_stderr`.
    #[inline]
    pub fn parity_tolerance(&self) -> f64 {
        self.call_stderr + self.put_stderr
    }
}

/// Reduces per-block estimates to prices and standard errors.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBlockCount`] for fewer than two blocks.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::{aggregate_blocks, BlockEstimate};
///
/// let blocks = [
///     BlockEstimate { call: 1.0, put: 2.0 },
///     BlockEstimate { call: 3.0, put: 2.0 },
/// ];
/// let result = aggregate_blocks(&blocks).unwrap();
///
/// assert_eq!(result.call_price, 2.0);
/// assert_eq!(result.call_stderr, 1.0);
/// assert_eq!(result.put_stderr, 0.0);
/// ```
pub fn aggregate_blocks(blocks: &[BlockEstimate]) -> Result<AggregateResult, ConfigError> {
    if blocks.len() < MIN_BLOCKS {
        return Err(ConfigError::InvalidBlockCount(blocks.len()));
    }

    let call = batched_mean(blocks.iter().map(|b| b.call), blocks.len());
    let put = batched_mean(blocks.iter().map(|b| b.put), blocks.len());

    Ok(AggregateResult {
        call_price: call.price,
        put_price: put.price,
        call_stderr: call.std_error,
        put_stderr: put.std_error,
    })
}

/// Mean and standard error of `n >= 2` samples (two-pass variance).
fn batched_mean<I>(samples: I, n: usize) -> PriceEstimate
where
    I: Iterator<Item = f64> + Clone,
{
    let n_f = n as f64;
    let mean = samples.clone().sum::<f64>() / n_f;
    let variance = samples.map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n_f - 1.0);

    PriceEstimate {
        price: mean,
        std_error: (variance / n_f).sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::config::SimulationConfigBuilder;
    use approx::assert_relative_eq;

    fn blocks(calls: &[f64], puts: &[f64]) -> Vec<BlockEstimate> {
        calls
            .iter()
            .zip(puts)
            .map(|(&call, &put)| BlockEstimate { call, put })
            .collect()
    }

    #[test]
    fn test_mean_and_stderr() {
        let calls = [0.10, 0.12, 0.11, 0.09, 0.13];
        let result = aggregate_blocks(&blocks(&calls, &[0.2; 5])).unwrap();

        let mean = calls.iter().sum::<f64>() / 5.0;
        let var = calls.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / 4.0;
        assert_relative_eq!(result.call_price, mean, epsilon = 1e-15);
        assert_relative_eq!(result.call_stderr, (var / 5.0).sqrt(), epsilon = 1e-15);
        assert_relative_eq!(result.put_price, 0.2, epsilon = 1e-15);
        assert_relative_eq!(result.put_stderr, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_too_few_blocks() {
        assert!(matches!(
            aggregate_blocks(&blocks(&[1.0], &[1.0])),
            Err(ConfigError::InvalidBlockCount(1))
        ));
        assert!(matches!(
            aggregate_blocks(&[]),
            Err(ConfigError::InvalidBlockCount(0))
        ));
    }

    #[test]
    fn test_nan_block_propagates() {
        let result = aggregate_blocks(&blocks(&[1.0, f64::NAN], &[1.0, 2.0])).unwrap();
        assert!(result.call_price.is_nan());
        assert!(result.call_stderr.is_nan());
        assert!(result.put_price.is_finite());
    }

    #[test]
    fn test_price_estimate_intervals() {
        let estimate = PriceEstimate {
            price: 10.0,
            std_error: 0.1,
        };

        assert_relative_eq!(estimate.confidence_95(), 1.96 * 0.1, epsilon = 1e-10);
        assert_relative_eq!(estimate.confidence_99(), 2.576 * 0.1, epsilon = 1e-10);

        let (lo, hi) = estimate.interval(3.0);
        assert_relative_eq!(lo, 9.7, epsilon = 1e-12);
        assert_relative_eq!(hi, 10.3, epsilon = 1e-12);
    }

    #[test]
    fn test_parity_gap_zero_for_exact_prices() {
        let config = SimulationConfigBuilder::sample()
            .dividend_yield(0.01)
            .build()
            .unwrap();
        let forward = config.spot() * (-0.01_f64).exp() - config.strike() * config.discount_factor();
        let result = AggregateResult {
            call_price: 0.05 + forward,
            put_price: 0.05,
            call_stderr: 0.001,
            put_stderr: 0.002,
        };

        assert_relative_eq!(result.parity_gap(&config), 0.0, epsilon = 1e-15);
        assert_relative_eq!(result.parity_tolerance(), 0.003);
        assert_eq!(result.call().std_error, 0.001);
        assert_eq!(result.put().price, 0.05);
    }
}
