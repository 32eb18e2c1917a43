//! Non-fatal numeric diagnostics of a simulation run.
//!
//! Zero-flooring in the variance scheme and overflow in `exp(X)` do not
//! abort a run. They are counted across all blocks and, past a threshold,
//! turned into [`NumericWarning`]s that travel with the result.

use std::fmt;

/// A recorded numeric-instability condition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum NumericWarning {
    /// The variance floor fired on more than `threshold` of all
    /// `(step, path)` updates; `dt` is likely too coarse.
    ExcessiveVarianceClamping {
        /// Observed fraction of floored updates.
        ratio: f64,
        /// Configured threshold.
        threshold: f64,
        /// Whether `2 kappa theta >= epsilon^2` holds.
        feller_satisfied: bool,
    },
    /// Terminal prices overflowed or became NaN and were excluded from the
    /// block means.
    NonFiniteTerminalPrices {
        /// Number of excluded terminal prices across all blocks.
        count: usize,
    },
}

impl fmt::Display for NumericWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericWarning::ExcessiveVarianceClamping {
                ratio,
                threshold,
                feller_satisfied,
            } => {
                write!(
                    f,
                    "variance floor hit on {:.2}% of updates (threshold {:.2}%)",
                    ratio * 100.0,
                    threshold * 100.0
                )?;
                if !feller_satisfied {
                    write!(f, "; Feller condition 2*kappa*theta >= epsilon^2 is violated")?;
                }
                Ok(())
            }
            NumericWarning::NonFiniteTerminalPrices { count } => {
                write!(f, "{} non-finite terminal prices excluded from the means", count)
            }
        }
    }
}

/// Counters and warnings collected over all blocks of a run.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationDiagnostics {
    /// Variance updates that hit the zero floor.
    pub clamped_updates: u64,
    /// Total variance updates, `nblocks * nsteps * npaths`.
    pub total_updates: u64,
    /// Terminal prices excluded as non-finite.
    pub non_finite_terminals: u64,
    /// Whether the Feller condition holds for the configured parameters.
    pub feller_satisfied: bool,
    /// Warnings raised from the counters above.
    pub warnings: Vec<NumericWarning>,
}

impl SimulationDiagnostics {
    /// Fraction of variance updates that hit the floor.
    pub fn clamp_ratio(&self) -> f64 {
        if self.total_updates == 0 {
            0.0
        } else {
            self.clamped_updates as f64 / self.total_updates as f64
        }
    }

    /// Returns `true` if any warning was raised.
    #[inline]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Derives warnings from the counters and logs each at `warn` level.
    pub(crate) fn raise_warnings(&mut self, clamp_threshold: f64) {
        let ratio = self.clamp_ratio();
        if ratio > clamp_threshold {
            self.warnings.push(NumericWarning::ExcessiveVarianceClamping {
                ratio,
                threshold: clamp_threshold,
                feller_satisfied: self.feller_satisfied,
            });
        }
        if self.non_finite_terminals > 0 {
            self.warnings.push(NumericWarning::NonFiniteTerminalPrices {
                count: self.non_finite_terminals as usize,
            });
        }

        for warning in &self.warnings {
            tracing::warn!(%warning, "numeric instability");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostics(clamped: u64, total: u64, non_finite: u64, feller: bool) -> SimulationDiagnostics {
        SimulationDiagnostics {
            clamped_updates: clamped,
            total_updates: total,
            non_finite_terminals: non_finite,
            feller_satisfied: feller,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_clamp_ratio() {
        assert_eq!(diagnostics(25, 100, 0, true).clamp_ratio(), 0.25);
        assert_eq!(SimulationDiagnostics::default().clamp_ratio(), 0.0);
    }

    #[test]
    fn test_no_warnings_below_threshold() {
        let mut d = diagnostics(4, 100, 0, true);
        d.raise_warnings(0.05);
        assert!(!d.has_warnings());
    }

    #[test]
    fn test_clamping_warning() {
        let mut d = diagnostics(30, 100, 0, false);
        d.raise_warnings(0.05);

        assert_eq!(
            d.warnings,
            vec![NumericWarning::ExcessiveVarianceClamping {
                ratio: 0.3,
                threshold: 0.05,
                feller_satisfied: false,
            }]
        );
        assert!(d.warnings[0].to_string().contains("Feller"));
    }

    #[test]
    fn test_non_finite_warning() {
        let mut d = diagnostics(0, 100, 3, true);
        d.raise_warnings(0.05);

        assert_eq!(d.warnings, vec![NumericWarning::NonFiniteTerminalPrices { count: 3 }]);
        assert_eq!(
            d.warnings[0].to_string(),
            "3 non-finite terminal prices excluded from the means"
        );
    }
}
