//! Numeric support for latent-factor arithmetic
//!
//! Factor blocks may be stored in `f32` or `f64`; scoring always accumulates
//! in `f64` so that the reduced statistic does not depend on the storage
//! precision of any one shard.

use num_traits::Float;

/// Element types usable in latent-factor blocks
///
/// Bounded by `Float` for arithmetic plus a lossless widening conversion into
/// `f64` for accumulation.
pub trait Factor: Float + Into<f64> + Copy + Send + Sync + 'static {}

impl Factor for f32 {}
impl Factor for f64 {}

/// Dense dot product over the latent dimension, accumulated in `f64`
///
/// Uses four partial sums so the accumulation chains stay independent; the
/// latent dimension may be large, so no small-`d` assumptions are made.
#[inline]
pub fn dot<T: Factor>(a: &[T], b: &[T]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same length");

    let mut sums = [0.0f64; 4];
    let mut chunks_a = a.chunks_exact(4);
    let mut chunks_b = b.chunks_exact(4);
    for (ca, cb) in chunks_a.by_ref().zip(chunks_b.by_ref()) {
        sums[0] += ca[0].into() * cb[0].into();
        sums[1] += ca[1].into() * cb[1].into();
        sums[2] += ca[2].into() * cb[2].into();
        sums[3] += ca[3].into() * cb[3].into();
    }

    let mut tail = 0.0f64;
    for (&x, &y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        tail += x.into() * y.into();
    }

    sums[0] + sums[1] + sums[2] + sums[3] + tail
}
