//! Lane bookkeeping
//!
//! A GKR sub-circuit is evaluated over `n` independent *lanes*. The sum-check
//! layer works over the boolean hypercube `{0,1}^v`, so every lane vector is
//! padded up to `2^v ≥ n` entries. This module centralizes that arithmetic
//! and the runtime switch for lane-parallel evaluation.
//!
//! Lane index bits are read **most significant first**: the first coordinate
//! of a hypercube point selects the upper half of a lane vector. Everything in
//! [`crate::poly`] follows the same convention.

#![forbid(unsafe_code)]

use crate::F;

#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
static PARALLEL_ENABLED: AtomicBool = AtomicBool::new(true);

const DEFAULT_CHUNK_SIZE: usize = 256;

/// Number of hypercube variables needed to index `lanes` lanes.
///
/// `num_vars_for(1) == 0`, `num_vars_for(5) == 3`. Zero lanes also map to zero
/// variables; callers reject empty inputs before reaching this point.
#[inline]
pub fn num_vars_for(lanes: usize) -> usize {
    lanes.max(1).next_power_of_two().trailing_zeros() as usize
}

/// Padded lane count `2^v` for `lanes` lanes.
#[inline]
pub fn padded_lanes(lanes: usize) -> usize {
    1usize << num_vars_for(lanes)
}

/// Copy `values` into a vector of length `padded`, filling the tail with `fill`.
pub fn pad_lanes(values: &[F], padded: usize, fill: F) -> Vec<F> {
    debug_assert!(values.len() <= padded, "cannot pad {} lanes down to {}", values.len(), padded);
    let mut out = Vec::with_capacity(padded);
    out.extend_from_slice(values);
    out.resize(padded, fill);
    out
}

/// Minimum number of lanes handed to one rayon task.
pub fn preferred_chunk_size(total_lanes: usize) -> usize {
    if total_lanes == 0 {
        1
    } else {
        DEFAULT_CHUNK_SIZE.min(total_lanes)
    }
}

/// Whether lane-parallel evaluation is currently enabled.
#[cfg(feature = "parallel")]
pub fn parallelism_enabled() -> bool {
    PARALLEL_ENABLED.load(Ordering::SeqCst)
}

/// Whether lane-parallel evaluation is currently enabled.
#[cfg(not(feature = "parallel"))]
pub fn parallelism_enabled() -> bool {
    false
}

/// Toggle lane parallelism; the previous setting is restored when the guard drops.
#[cfg(feature = "parallel")]
pub fn set_parallelism(enabled: bool) -> ParallelismGuard {
    let previous = PARALLEL_ENABLED.swap(enabled, Ordering::SeqCst);
    ParallelismGuard { previous }
}

/// Toggle lane parallelism (no-op without the `parallel` feature).
#[cfg(not(feature = "parallel"))]
pub fn set_parallelism(_enabled: bool) -> ParallelismGuard {
    ParallelismGuard {}
}

/// Restores the previous parallelism setting on drop.
pub struct ParallelismGuard {
    #[cfg(feature = "parallel")]
    previous: bool,
}

#[cfg(feature = "parallel")]
impl Drop for ParallelismGuard {
    fn drop(&mut self) {
        PARALLEL_ENABLED.store(self.previous, Ordering::SeqCst);
    }
}
