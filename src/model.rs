//! Read-only view over the sharded latent-factor model
//!
//! Each worker holds one dense user-factor block (its owned rows) and one
//! item-factor block per worker, including its own. Blocks are row-major:
//! vector `i` occupies `[i * dim, (i + 1) * dim)`.

use crate::error::{Error, Result};
use crate::math::Factor;
use crate::partition::ItemLocation;

/// Zero-copy accessor over one user block and all item blocks
///
/// Indices must already be validated through `IdMap` and
/// `PartitionBoundaries`; requesting a vector outside a block's bounds is a
/// caller contract violation and panics.
#[derive(Clone, Debug)]
pub struct ShardedModel<'a, T: Factor = f64> {
    users: &'a [T],
    items: Vec<&'a [T]>,
    dim: usize,
}

impl<'a, T: Factor> ShardedModel<'a, T> {
    /// Create a model view, validating block shapes
    ///
    /// Every block length must be a multiple of `dim`; anything else would
    /// silently truncate vectors, so it fails fast instead.
    pub fn new(users: &'a [T], items: Vec<&'a [T]>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidInput(
                "Latent dimension must be positive".to_string(),
            ));
        }
        if users.len() % dim != 0 {
            return Err(Error::shape_mismatch(
                users.len() / dim * dim,
                users.len(),
                "user factor block",
            ));
        }
        for (k, block) in items.iter().enumerate() {
            if block.len() % dim != 0 {
                return Err(Error::shape_mismatch(
                    block.len() / dim * dim,
                    block.len(),
                    &format!("item factor block {k}"),
                ));
            }
        }
        Ok(Self { users, items, dim })
    }

    /// Latent dimension `d`
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of user rows in this worker's block
    pub fn num_rows(&self) -> usize {
        self.users.len() / self.dim
    }

    /// Number of item blocks (one per worker)
    pub fn num_item_blocks(&self) -> usize {
        self.items.len()
    }

    /// Number of item rows in one worker's block
    pub fn item_block_rows(&self, worker: usize) -> usize {
        self.items[worker].len() / self.dim
    }

    /// User latent vector for a block-relative row index
    #[inline]
    pub fn user_vector(&self, local_row: usize) -> &'a [T] {
        assert!(
            local_row < self.num_rows(),
            "User row {local_row} out of bounds for block of {} rows",
            self.num_rows()
        );
        &self.users[local_row * self.dim..(local_row + 1) * self.dim]
    }

    /// Item latent vector at a resolved shard location
    #[inline]
    pub fn item_vector(&self, loc: ItemLocation) -> &'a [T] {
        let block = self.items[loc.worker];
        assert!(
            (loc.offset + 1) * self.dim <= block.len(),
            "Item offset {} out of bounds for block {} of {} rows",
            loc.offset,
            loc.worker,
            block.len() / self.dim
        );
        &block[loc.offset * self.dim..(loc.offset + 1) * self.dim]
    }
}
