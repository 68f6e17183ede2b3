//! Scheduled evaluation units and run orchestration
//!
//! The external scheduler hands each worker a stream of sparse test rows.
//! All run state except the accumulator is immutable and shared read-only
//! across tasks; the accumulator is either a shared mutex-guarded value
//! (`EvaluationTask`, for schedulers that mutate a result in place) or a set
//! of task-private partials folded after the fact (`evaluate_rows*`, which
//! avoids contention entirely and is preferred for high task counts).

use std::ops::Range;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::math::Factor;
use crate::model::ShardedModel;
use crate::partition::PartitionBoundaries;
use crate::remap::IdMap;
use crate::scorer::PredictionScorer;
use crate::types::{ErrorAccumulator, SparseTestRow};

/// Immutable per-run evaluation state for one worker
///
/// Constructed once by external setup and passed by reference into every
/// task; never mutated after construction.
#[derive(Clone, Debug)]
pub struct EvalContext<'a, T: Factor = f64> {
    worker_id: usize,
    row_map: &'a [u32],
    col_map: &'a [u32],
    row_range: Range<usize>,
    partition: PartitionBoundaries,
    model: ShardedModel<'a, T>,
    alpha: f64,
}

impl<'a, T: Factor> EvalContext<'a, T> {
    /// Assemble and cross-validate one worker's run state
    ///
    /// `boundaries` is the cumulative item-count table (worker count + 1
    /// entries); `user_block` holds this worker's owned rows, `item_blocks`
    /// one block per worker. Shape disagreements between the pieces are
    /// caller contract violations and fail fast.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_id: usize,
        row_map: &'a [u32],
        col_map: &'a [u32],
        row_range: Range<usize>,
        boundaries: Vec<u64>,
        user_block: &'a [T],
        item_blocks: Vec<&'a [T]>,
        alpha: f64,
        dim: usize,
    ) -> Result<Self> {
        let partition = PartitionBoundaries::new(boundaries)?;
        if worker_id >= partition.num_workers() {
            return Err(Error::InvalidInput(format!(
                "Worker id {worker_id} out of range for {} workers",
                partition.num_workers()
            )));
        }
        if item_blocks.len() != partition.num_workers() {
            return Err(Error::shape_mismatch(
                partition.num_workers(),
                item_blocks.len(),
                "item block count",
            ));
        }
        if alpha < 0.0 || alpha.is_nan() {
            return Err(Error::InvalidInput(format!(
                "Confidence scale alpha must be >= 0, got {alpha}"
            )));
        }

        let model = ShardedModel::new(user_block, item_blocks, dim)?;
        if model.num_rows() != row_range.len() {
            return Err(Error::shape_mismatch(
                row_range.len(),
                model.num_rows(),
                "user factor block rows",
            ));
        }
        for k in 0..partition.num_workers() {
            let block_rows = model.item_block_rows(k);
            if block_rows as u64 != partition.items_owned(k) {
                return Err(Error::shape_mismatch(
                    partition.items_owned(k) as usize,
                    block_rows,
                    &format!("item factor block {k} rows"),
                ));
            }
        }

        log::debug!(
            "Evaluation context for worker {worker_id}: {} workers, {} rows, {} items, dim {dim}, alpha {alpha}",
            partition.num_workers(),
            row_range.len(),
            partition.total_items(),
        );

        Ok(Self {
            worker_id,
            row_map,
            col_map,
            row_range,
            partition,
            model,
            alpha,
        })
    }

    /// This worker's id
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Number of workers in the run
    pub fn num_workers(&self) -> usize {
        self.partition.num_workers()
    }

    /// Half-open range of local row indices this worker owns
    pub fn row_range(&self) -> Range<usize> {
        self.row_range.clone()
    }

    /// Build a scorer borrowing this context's run state
    pub fn scorer(&self) -> PredictionScorer<'_, T> {
        PredictionScorer::new(
            IdMap::new(self.row_map),
            IdMap::new(self.col_map),
            self.row_range.clone(),
            &self.partition,
            &self.model,
            self.alpha,
        )
    }
}

/// One scheduled unit of evaluation work
///
/// Wraps the scorer over a single test row and a shared accumulator. Scoring
/// happens into a task-private partial; only the non-empty partial touches
/// the shared value, under its lock. Safe to run from any number of threads
/// of the same worker process at once.
pub struct EvaluationTask<'a, T: Factor = f64> {
    ctx: &'a EvalContext<'a, T>,
    shared: &'a Mutex<ErrorAccumulator>,
}

impl<'a, T: Factor> EvaluationTask<'a, T> {
    /// Create a task bound to a run context and its shared accumulator
    pub fn new(ctx: &'a EvalContext<'a, T>, shared: &'a Mutex<ErrorAccumulator>) -> Self {
        Self { ctx, shared }
    }

    /// Score one test row and fold the contribution into the shared result
    ///
    /// Rows and entries with unmapped identifiers are silent skips; the only
    /// error paths are structural contract violations.
    pub fn run(&self, row: &SparseTestRow) -> Result<()> {
        let mut partial = ErrorAccumulator::new();
        self.ctx.scorer().score_row(row, &mut partial)?;
        if partial.is_empty() {
            return Ok(());
        }
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| Error::Execution("Result accumulator lock poisoned".to_string()))?;
        shared.merge(&partial);
        Ok(())
    }
}

/// Evaluate a batch of test rows sequentially
///
/// Returns this worker's partial `(sum, count)` accumulator; the caller
/// reduces partials across workers before reading the metric.
pub fn evaluate_rows<T: Factor>(
    ctx: &EvalContext<'_, T>,
    rows: &[SparseTestRow],
) -> Result<ErrorAccumulator> {
    let scorer = ctx.scorer();
    let mut acc = ErrorAccumulator::new();
    for row in rows {
        scorer.score_row(row, &mut acc)?;
    }
    Ok(acc)
}

/// Evaluate a batch of test rows in parallel
///
/// Each rayon worker folds into its own private accumulator; the partials
/// merge in a final reduction, so no lock is ever taken on the hot path.
/// Agrees with [`evaluate_rows`] up to floating-point summation order.
#[cfg(feature = "parallel")]
pub fn evaluate_rows_parallel<T: Factor>(
    ctx: &EvalContext<'_, T>,
    rows: &[SparseTestRow],
) -> Result<ErrorAccumulator> {
    use rayon::prelude::*;

    let scorer = ctx.scorer();
    rows.par_iter()
        .try_fold(ErrorAccumulator::new, |mut acc, row| {
            scorer.score_row(row, &mut acc)?;
            Ok(acc)
        })
        .try_reduce(ErrorAccumulator::new, |mut a, b| {
            a.merge(&b);
            Ok(a)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity(n: usize) -> Vec<u32> {
        (1..=n as u32).collect()
    }

    struct Blocks {
        row_map: Vec<u32>,
        col_map: Vec<u32>,
        users: Vec<f64>,
        items0: Vec<f64>,
        items1: Vec<f64>,
    }

    fn blocks() -> Blocks {
        Blocks {
            row_map: identity(2),
            col_map: identity(4),
            users: vec![1.0, 0.0, 0.0, 1.0],
            items0: vec![1.0, 0.0, 0.5, 0.5],
            items1: vec![0.0, 1.0, 0.25, 0.25],
        }
    }

    fn context(b: &Blocks) -> EvalContext<'_, f64> {
        EvalContext::new(
            0,
            &b.row_map,
            &b.col_map,
            0..2,
            vec![0, 2, 4],
            &b.users,
            vec![&b.items0, &b.items1],
            0.0,
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_context_rejects_wrong_block_count() {
        let b = blocks();
        let result = EvalContext::new(
            0,
            &b.row_map,
            &b.col_map,
            0..2,
            vec![0, 2, 4],
            &b.users,
            vec![&b.items0],
            0.0,
            2,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_context_rejects_row_range_mismatch() {
        let b = blocks();
        let result = EvalContext::new(
            0,
            &b.row_map,
            &b.col_map,
            0..5,
            vec![0, 2, 4],
            &b.users,
            vec![&b.items0, &b.items1],
            0.0,
            2,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_context_rejects_item_block_partition_mismatch() {
        let b = blocks();
        // Partition says worker 0 owns 3 items but its block holds 2
        let result = EvalContext::new(
            0,
            &b.row_map,
            &b.col_map,
            0..2,
            vec![0, 3, 4],
            &b.users,
            vec![&b.items0, &b.items1],
            0.0,
            2,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_context_rejects_bad_worker_id() {
        let b = blocks();
        let result = EvalContext::new(
            7,
            &b.row_map,
            &b.col_map,
            0..2,
            vec![0, 2, 4],
            &b.users,
            vec![&b.items0, &b.items1],
            0.0,
            2,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_context_rejects_negative_alpha() {
        let b = blocks();
        let result = EvalContext::new(
            0,
            &b.row_map,
            &b.col_map,
            0..2,
            vec![0, 2, 4],
            &b.users,
            vec![&b.items0, &b.items1],
            -1.0,
            2,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_task_folds_into_shared_accumulator() {
        let b = blocks();
        let ctx = context(&b);
        let shared = Mutex::new(ErrorAccumulator::new());
        let task = EvaluationTask::new(&ctx, &shared);

        task.run(&SparseTestRow::new(0, vec![0, 2], vec![5.0, 3.0]))
            .unwrap();
        task.run(&SparseTestRow::new(99, vec![0], vec![1.0])).unwrap();

        let acc = shared.lock().unwrap();
        assert_relative_eq!(acc.sum(), 1.0);
        assert_eq!(acc.count(), 2);
    }

    #[test]
    fn test_tasks_from_multiple_threads() {
        let b = blocks();
        let ctx = context(&b);
        let shared = Mutex::new(ErrorAccumulator::new());

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let task = EvaluationTask::new(&ctx, &shared);
                    for _ in 0..25 {
                        task.run(&SparseTestRow::new(0, vec![2], vec![3.0])).unwrap();
                    }
                });
            }
        });

        let acc = shared.lock().unwrap();
        assert_eq!(acc.count(), 100);
        assert_relative_eq!(acc.sum(), 100.0);
    }

    #[test]
    fn test_evaluate_rows_batch() {
        let b = blocks();
        let ctx = context(&b);
        let rows = vec![
            SparseTestRow::new(0, vec![0, 2], vec![5.0, 3.0]),
            SparseTestRow::new(1, vec![1], vec![2.0]),
            SparseTestRow::new(42, vec![0], vec![1.0]), // unmapped row
        ];

        let acc = evaluate_rows(&ctx, &rows).unwrap();
        assert_eq!(acc.count(), 3);
        // Row 1: u = [0, 1] against item 1 = [0.5, 0.5], predicted 0.5,
        // residual 0.25
        assert_relative_eq!(acc.sum(), 1.25);
    }

    #[test]
    fn test_split_across_tasks_matches_single_batch() {
        let b = blocks();
        let ctx = context(&b);
        let rows: Vec<_> = (0..2)
            .map(|id| SparseTestRow::new(id, vec![0, 1, 2, 3], vec![1.0, 2.0, 3.0, 4.0]))
            .collect();

        let whole = evaluate_rows(&ctx, &rows).unwrap();

        let mut folded = evaluate_rows(&ctx, &rows[..1]).unwrap();
        let second = evaluate_rows(&ctx, &rows[1..]).unwrap();
        folded.merge(&second);

        assert_eq!(whole.count(), folded.count());
        assert_relative_eq!(whole.sum(), folded.sum());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let b = blocks();
        let ctx = context(&b);
        let rows: Vec<_> = (0..64)
            .map(|i| SparseTestRow::new(i % 2, vec![i % 4], vec![(i % 5) as f64]))
            .collect();

        let seq = evaluate_rows(&ctx, &rows).unwrap();
        let par = evaluate_rows_parallel(&ctx, &rows).unwrap();
        assert_eq!(seq.count(), par.count());
        assert_relative_eq!(seq.sum(), par.sum(), epsilon = 1e-12);
    }
}
