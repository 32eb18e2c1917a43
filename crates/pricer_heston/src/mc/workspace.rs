//! Pre-allocated per-worker buffers for block simulation.
//!
//! # Memory Layout
//!
//! All matrices are time-major (see [`PathMatrix`]):
//! - `variates`: two `n_steps × n_paths` matrices (`X1`, `X2`)
//! - `variance`: `(n_steps + 1) × n_paths`
//! - `log_returns`: `n_paths` running log-price accumulators
//! - `terminal`: `n_paths` terminal prices
//!
//! The full log-price matrix is not held here; it is only materialised for
//! the exported block.

use super::matrix::PathMatrix;
use super::variates::VariatePair;

/// Reusable buffers for simulating one block after another.
///
/// A workspace carries no state between blocks: every buffer is fully
/// overwritten by the next block, so one workspace per worker thread is
/// enough.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::BlockWorkspace;
///
/// let workspace = BlockWorkspace::new(1_000, 50);
///
/// assert_eq!(workspace.n_paths(), 1_000);
/// assert_eq!(workspace.n_steps(), 50);
/// ```
#[derive(Clone, Debug)]
pub struct BlockWorkspace {
    pub(crate) variates: VariatePair,
    pub(crate) variance: PathMatrix,
    pub(crate) log_returns: Vec<f64>,
    pub(crate) terminal: Vec<f64>,
}

impl BlockWorkspace {
    /// Allocates buffers for blocks of `n_paths` paths and `n_steps` steps.
    pub fn new(n_paths: usize, n_steps: usize) -> Self {
        Self {
            variates: VariatePair::zeros(n_steps, n_paths),
            variance: PathMatrix::zeros(n_steps + 1, n_paths),
            log_returns: vec![0.0; n_paths],
            terminal: vec![0.0; n_paths],
        }
    }

    /// Paths per block.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.terminal.len()
    }

    /// Time steps per path.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.variates.x1.n_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_shapes() {
        let ws = BlockWorkspace::new(7, 3);

        assert_eq!(ws.variates.x1.n_rows(), 3);
        assert_eq!(ws.variates.x2.n_paths(), 7);
        assert_eq!(ws.variance.n_rows(), 4);
        assert_eq!(ws.variance.n_paths(), 7);
        assert_eq!(ws.log_returns.len(), 7);
        assert_eq!(ws.terminal.len(), 7);
    }

    #[test]
    fn test_single_path_single_step() {
        let ws = BlockWorkspace::new(1, 1);
        assert_eq!(ws.n_paths(), 1);
        assert_eq!(ws.n_steps(), 1);
        assert_eq!(ws.variance.as_slice().len(), 2);
    }
}
