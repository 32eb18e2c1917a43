//! Time-major matrix storage for simulated quantities.
//!
//! # Memory Layout
//!
//! Rows are time indices and columns are paths, stored row-major:
//! `data[step * n_paths + path]`. One time step of every path is therefore a
//! contiguous slice, which is what the per-step recurrences consume.

/// Dense row-major matrix with one row per time index and one column per
/// simulated path.
///
/// # Examples
///
/// ```rust
/// use pricer_heston::mc::PathMatrix;
///
/// let mut m = PathMatrix::zeros(3, 2);
/// m.row_mut(1)[0] = 4.0;
///
/// assert_eq!(m.get(1, 0), 4.0);
/// assert_eq!(m.column(0).collect::<Vec<_>>(), vec![0.0, 4.0, 0.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathMatrix {
    n_rows: usize,
    n_paths: usize,
    data: Vec<f64>,
}

impl PathMatrix {
    /// Creates a zero-filled matrix of `n_rows × n_paths`.
    pub fn zeros(n_rows: usize, n_paths: usize) -> Self {
        Self {
            n_rows,
            n_paths,
            data: vec![0.0; n_rows * n_paths],
        }
    }

    /// Number of rows (time indices).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (paths).
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Entry at `(row, path)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, path: usize) -> f64 {
        assert!(path < self.n_paths, "path index {} out of bounds", path);
        self.data[row * self.n_paths + path]
    }

    /// All paths at time index `row`.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n_paths;
        &self.data[start..start + self.n_paths]
    }

    /// Mutable slice of all paths at time index `row`.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.n_paths;
        &mut self.data[start..start + self.n_paths]
    }

    /// Last time index.
    #[inline]
    pub fn last_row(&self) -> &[f64] {
        self.row(self.n_rows - 1)
    }

    /// Row `row` (read-only) together with row `row + 1` (mutable), for
    /// one step of a time recurrence.
    #[inline]
    pub fn step_rows_mut(&mut self, row: usize) -> (&[f64], &mut [f64]) {
        let split = (row + 1) * self.n_paths;
        let (head, tail) = self.data.split_at_mut(split);
        (&head[split - self.n_paths..], &mut tail[..self.n_paths])
    }

    /// Iterator over one path through time.
    pub fn column(&self, path: usize) -> impl Iterator<Item = f64> + '_ {
        assert!(path < self.n_paths, "path index {} out of bounds", path);
        self.data.iter().skip(path).step_by(self.n_paths).copied()
    }

    /// Underlying row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable underlying row-major buffer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
