//! Per-row prediction scoring
//!
//! For one sparse test row, predicts each rated entry as the dot product of
//! the row's user vector with the entry's item vector, and folds the
//! confidence-weighted squared residual into an accumulator.
//!
//! Rows owned by another worker and identifiers unseen during training are
//! normal occurrences in sharded test data and are skipped silently; only
//! structural inconsistencies (a column index no worker owns) surface as
//! errors.

use std::ops::Range;

use crate::error::Result;
use crate::math::{dot, Factor};
use crate::model::ShardedModel;
use crate::partition::PartitionBoundaries;
use crate::remap::IdMap;
use crate::types::{ErrorAccumulator, SparseTestRow};

/// Scores sparse test rows against one worker's view of the sharded model
///
/// Borrows only read-only run state, so one scorer may be shared freely
/// across concurrent tasks.
#[derive(Clone, Debug)]
pub struct PredictionScorer<'a, T: Factor = f64> {
    rows: IdMap<'a>,
    cols: IdMap<'a>,
    row_range: Range<usize>,
    partition: &'a PartitionBoundaries,
    model: &'a ShardedModel<'a, T>,
    alpha: f64,
}

impl<'a, T: Factor> PredictionScorer<'a, T> {
    /// Create a scorer over one worker's run state
    ///
    /// `row_range` is the half-open range of local row indices this worker
    /// owns; rows mapping outside it belong to other workers.
    pub fn new(
        rows: IdMap<'a>,
        cols: IdMap<'a>,
        row_range: Range<usize>,
        partition: &'a PartitionBoundaries,
        model: &'a ShardedModel<'a, T>,
        alpha: f64,
    ) -> Self {
        Self {
            rows,
            cols,
            row_range,
            partition,
            model,
            alpha,
        }
    }

    /// The confidence scale applied to ratings
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Check whether a test row's global id maps into this worker's range
    pub fn owns_row(&self, row: &SparseTestRow) -> bool {
        self.rows
            .local(row.id)
            .is_some_and(|local| self.row_range.contains(&local))
    }

    /// Score one test row into `acc`
    ///
    /// Unmapped rows and rows owned by another worker leave `acc` untouched.
    /// Unmapped columns skip that entry only; remaining entries in the row
    /// are still scored. Each scored entry contributes
    /// `(1 - dot(u, v))^2 * (1 + alpha * rating)` to the sum and `1` to the
    /// count. Entry order does not affect the totals.
    pub fn score_row(&self, row: &SparseTestRow, acc: &mut ErrorAccumulator) -> Result<()> {
        let Some(local_row) = self.rows.local(row.id) else {
            return Ok(());
        };
        if !self.row_range.contains(&local_row) {
            return Ok(());
        }

        let user = self.model.user_vector(local_row - self.row_range.start);

        for (col_id, rating) in row.iter() {
            let Some(local_col) = self.cols.local(col_id) else {
                continue;
            };
            let loc = self.partition.owner_of(local_col)?;
            let item = self.model.item_vector(loc);

            let predicted = dot(user, item);
            let weight = 1.0 + self.alpha * rating;
            let residual = (1.0 - predicted) * (1.0 - predicted) * weight;
            acc.record(residual);
        }
        Ok(())
    }
}
