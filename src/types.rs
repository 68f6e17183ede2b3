//! Data types shared across the evaluation pipeline

/// One sparse row of the test matrix
///
/// Carries the row's global identifier and its rating entries as parallel
/// arrays of global column ids and rating values, the usual layout for
/// sparse row slices handed out by a partitioned data source.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseTestRow {
    /// Global row identifier
    pub id: usize,
    /// Global column identifiers of the rated items
    pub indices: Vec<usize>,
    /// Rating values (same length as `indices`)
    pub ratings: Vec<f64>,
}

impl SparseTestRow {
    /// Create a test row
    ///
    /// # Panics
    /// If `indices` and `ratings` have different lengths.
    pub fn new(id: usize, indices: Vec<usize>, ratings: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            ratings.len(),
            "Indices and ratings must have same length"
        );
        Self {
            id,
            indices,
            ratings,
        }
    }

    /// Number of rating entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if the row has no entries
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over (global column id, rating) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.ratings.iter().copied())
    }
}

/// Accumulated weighted squared residuals and their count
///
/// A commutative monoid: partial accumulators from any task split merge into
/// the same total regardless of order, up to floating-point summation order.
/// The caller owns the reduction barrier; nothing reads a run's accumulator
/// until every task has completed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ErrorAccumulator {
    sum: f64,
    count: u64,
}

impl ErrorAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one weighted squared residual
    #[inline]
    pub fn record(&mut self, residual: f64) {
        self.sum += residual;
        self.count += 1;
    }

    /// Fold another accumulator's contribution into this one
    pub fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Accumulated weighted squared residual
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of scored entries
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Check if nothing has been scored
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Root-mean-square error over the accumulated entries
    ///
    /// Meaningful only after the cross-worker reduction; `None` when no
    /// entries were scored.
    pub fn rmse(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some((self.sum / self.count as f64).sqrt())
        }
    }
}
