//! Item-shard ownership resolution
//!
//! The partitioning stage splits the item index space into contiguous ranges,
//! one per worker, and describes the split as a prefix-sum table of
//! cumulative item counts. Worker `k` owns local item indices
//! `[bounds[k], bounds[k + 1])`.

use crate::error::{Error, Result};

/// Location of an item's latent vector within the sharded model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemLocation {
    /// Worker whose item block holds the vector
    pub worker: usize,
    /// Row offset within that worker's block
    pub offset: usize,
}

/// Validated partition boundary table
///
/// Holds `worker count + 1` cumulative item counts. The table is fixed for
/// the lifetime of an evaluation run and shared read-only across tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionBoundaries {
    bounds: Vec<u64>,
}

impl PartitionBoundaries {
    /// Create a boundary table, validating its shape
    ///
    /// Requires at least one worker (two entries), a leading `0`, and a
    /// non-decreasing sequence. Violations are configuration errors.
    pub fn new(bounds: Vec<u64>) -> Result<Self> {
        if bounds.len() < 2 {
            return Err(Error::InvalidPartition(format!(
                "Boundary table needs at least 2 entries, got {}",
                bounds.len()
            )));
        }
        if bounds[0] != 0 {
            return Err(Error::InvalidPartition(format!(
                "Boundary table must start at 0, got {}",
                bounds[0]
            )));
        }
        if bounds.windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::InvalidPartition(
                "Boundary table must be non-decreasing".to_string(),
            ));
        }
        Ok(Self { bounds })
    }

    /// Number of workers the item space is split across
    pub fn num_workers(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Total item count across all workers
    pub fn total_items(&self) -> u64 {
        *self.bounds.last().unwrap_or(&0)
    }

    /// Number of items a worker owns
    pub fn items_owned(&self, worker: usize) -> u64 {
        self.bounds[worker + 1] - self.bounds[worker]
    }

    /// Resolve which worker owns a local column index, and where
    ///
    /// Linear scan: the worker count is orders of magnitude smaller than the
    /// rating count, so this is not worth a binary search. An index past the
    /// last boundary means the caller constructed the partition and the
    /// column map inconsistently; that is fatal, not skippable, since
    /// masking it would silently corrupt the aggregate statistic.
    #[inline]
    pub fn owner_of(&self, local_col: usize) -> Result<ItemLocation> {
        for k in 0..self.num_workers() {
            if (local_col as u64) < self.bounds[k + 1] {
                return Ok(ItemLocation {
                    worker: k,
                    offset: local_col - self.bounds[k] as usize,
                });
            }
        }
        Err(Error::no_owner(local_col, self.total_items()))
    }
}
