//! the pruning adjuster
//! - converts a pruning fraction into the fraction of surviving elements
//! - sizes the structural metadata that marks which blocks survived

use eyre::{eyre, Result};

/// fraction of elements that survive pruning.
///
/// negative results are clamped to 0, the upper bound is not: a negative
/// `prune_frac` yields a fraction above 1. range checks live at the
/// [`evaluate`](super::estimator::evaluate) boundary.
pub fn surviving_fraction(prune_frac: f64) -> f64 {
    (1.0 - prune_frac).max(0.0)
}

/// bytes of pruning metadata for a `k x n` operand.
///
/// one metadata entry of `bits_per_element` bits per structural block of
/// `block_size` rows along `k`, a partial block still needs its entry.
pub fn metadata_bytes(k: u64, n: u64, block_size: u64, bits_per_element: u32) -> Result<u64> {
    let blocks = k / block_size + u64::from(k % block_size != 0);
    let bits = blocks as u128 * n as u128 * bits_per_element as u128;
    u64::try_from((bits + 7) / 8)
        .map_err(|_| eyre!("metadata of a {k} x {n} operand overflows a u64"))
}
