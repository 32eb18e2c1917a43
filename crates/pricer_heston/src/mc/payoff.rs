//! Discounted European payoffs over one block of terminal prices.

/// Discounted call and put estimates from one block.
///
/// Created once per block and never mutated; only these two numbers leave
/// the block.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockEstimate {
    /// `exp(-rT) * mean(max(S - K, 0))`.
    pub call: f64,
    /// `exp(-rT) * mean(max(K - S, 0))`.
    pub put: f64,
}

/// Result of pricing one block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockPayoff {
    /// Discounted call/put estimates.
    pub estimate: BlockEstimate,
    /// Terminal prices excluded from the mean because they were not finite.
    pub non_finite: usize,
}

/// Averages discounted call and put payoffs over `terminal_prices`.
///
/// Non-finite terminal prices (overflowed `exp`, or NaN) are excluded from
/// both means and counted. A block with no finite price yields NaN
/// estimates.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::block_payoff;
///
/// let payoff = block_payoff(&[0.9, 1.0, 1.3], 1.0, 1.0);
///
/// assert!((payoff.estimate.call - 0.1).abs() < 1e-12);
/// assert!((payoff.estimate.put - 0.1 / 3.0).abs() < 1e-12);
/// assert_eq!(payoff.non_finite, 0);
/// ```
pub fn block_payoff(terminal_prices: &[f64], strike: f64, discount_factor: f64) -> BlockPayoff {
    let mut call_sum = 0.0;
    let mut put_sum = 0.0;
    let mut finite = 0usize;

    for &s in terminal_prices {
        if !s.is_finite() {
            continue;
        }
        call_sum += (s - strike).max(0.0);
        put_sum += (strike - s).max(0.0);
        finite += 1;
    }

    let estimate = if finite == 0 {
        BlockEstimate {
            call: f64::NAN,
            put: f64::NAN,
        }
    } else {
        let n = finite as f64;
        BlockEstimate {
            call: discount_factor * call_sum / n,
            put: discount_factor * put_sum / n,
        }
    };

    BlockPayoff {
        estimate,
        non_finite: terminal_prices.len() - finite,
    }
}
