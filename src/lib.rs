//! Distributed rating-prediction evaluation for partitioned ALS models
//!
//! This crate scores a sparse test matrix against a matrix-factorization
//! model whose rows and columns are sharded across independent workers. Each
//! worker holds its own dense user-factor block and one item-factor block per
//! worker; test rows arrive from an external scheduler, one task per row, and
//! every scored entry contributes a confidence-weighted squared residual to a
//! shared `(sum, count)` statistic. The caller reduces the per-worker
//! statistics and reads `sqrt(sum / count)`.
//!
//! # Components
//!
//! - [`IdMap`] — global-to-local identifier remapping
//! - [`PartitionBoundaries`] — item-shard ownership resolution
//! - [`ShardedModel`] — zero-copy view over the factor blocks
//! - [`PredictionScorer`] — per-row dot-product scoring
//! - [`EvalContext`] / [`EvaluationTask`] — immutable run state and the
//!   scheduled unit of work
//!
//! Training, convergence, partitioning policy, and the cross-worker reduction
//! all live outside this crate.
//!
//! # Example
//!
//! ```rust
//! use als_eval::{evaluate_rows, EvalContext, SparseTestRow};
//!
//! // One worker, two users, two items, d = 2, identity remapping
//! let row_map = vec![1u32, 2];
//! let col_map = vec![1u32, 2];
//! let users = vec![1.0, 0.0, 0.0, 1.0];
//! let items = vec![1.0, 0.0, 0.0, 1.0];
//!
//! let ctx = EvalContext::new(
//!     0, &row_map, &col_map, 0..2, vec![0, 2], &users, vec![&items[..]], 0.0, 2,
//! )?;
//!
//! let rows = vec![SparseTestRow::new(0, vec![0, 1], vec![5.0, 1.0])];
//! let partial = evaluate_rows(&ctx, &rows)?;
//! assert_eq!(partial.count(), 2);
//! # Ok::<(), als_eval::Error>(())
//! ```

pub mod error;
pub mod math;
pub mod model;
pub mod partition;
pub mod remap;
pub mod scorer;
pub mod task;
pub mod types;

pub use error::{Error, Result};
pub use math::{dot, Factor};
pub use model::ShardedModel;
pub use partition::{ItemLocation, PartitionBoundaries};
pub use remap::IdMap;
pub use scorer::PredictionScorer;
pub use task::{evaluate_rows, EvalContext, EvaluationTask};
#[cfg(feature = "parallel")]
pub use task::evaluate_rows_parallel;
pub use types::{ErrorAccumulator, SparseTestRow};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ErrorAccumulator, EvalContext, EvaluationTask, IdMap, PartitionBoundaries,
        PredictionScorer, Result, ShardedModel, SparseTestRow,
    };

    pub use crate::error::Error;
    pub use crate::task::evaluate_rows;
    #[cfg(feature = "parallel")]
    pub use crate::task::evaluate_rows_parallel;
}
