//! the workload: matmul descriptors and their serialized byte footprint

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

use super::pruning::{metadata_bytes, surviving_fraction};
use crate::settings::PruningConfig;

/// one matrix multiply `[m x k] * [k x n]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    pub m: u64,
    pub k: u64,
    pub n: u64,
    /// sparsity of the operation's own operands, sizes its byte footprint
    #[serde(default)]
    pub prune_frac: f64,
}

impl Operation {
    pub fn new(name: impl Into<String>, m: u64, k: u64, n: u64) -> Self {
        Self {
            name: name.into(),
            m,
            k,
            n,
            prune_frac: 0.0,
        }
    }

    pub fn with_prune_frac(mut self, prune_frac: f64) -> Self {
        self.prune_frac = prune_frac;
        self
    }

    /// dense MAC count, an error if it does not fit in a `u64`
    pub fn dense_macs(&self) -> Result<u64> {
        self.m
            .checked_mul(self.k)
            .and_then(|mk| mk.checked_mul(self.n))
            .ok_or_else(|| {
                eyre!(
                    "operation {:?} is too large: ({}, {}, {})",
                    self.name,
                    self.m,
                    self.k,
                    self.n
                )
            })
    }
}

/// ops with diverse arithmetic intensity, from memory bound to compute bound
pub fn default_workload() -> Vec<Operation> {
    vec![
        Operation::new("mem_bound_16", 16, 128, 16),
        Operation::new("mem_bound_32", 32, 128, 32),
        Operation::new("transition_64", 64, 128, 64),
        Operation::new("compute_bound_128", 128, 128, 128),
        Operation::new("compute_bound_256", 256, 256, 256),
    ]
}

/// bytes of `element_count` packed elements, a partial byte rounds up
pub fn tensor_bytes(element_count: u64, bits_per_element: u32) -> Result<u64> {
    let bits = element_count as u128 * bits_per_element as u128;
    u64::try_from((bits + 7) / 8)
        .map_err(|_| eyre!("{element_count} elements of {bits_per_element} bits overflow a u64"))
}

/// total bytes moved by one matmul: the two pruned inputs, the dense output, and the pruning metadata
pub fn matmul_bytes(
    m: u64,
    k: u64,
    n: u64,
    bits_per_element: u32,
    prune_frac: f64,
    pruning: &PruningConfig,
) -> Result<u64> {
    let surviving = surviving_fraction(prune_frac);
    let elements = |rows: u64, cols: u64| {
        rows.checked_mul(cols)
            .ok_or_else(|| eyre!("a {rows} x {cols} operand overflows a u64"))
    };
    let pruned = |elements: u64| (elements as f64 * surviving).floor() as u64;
    let a = tensor_bytes(pruned(elements(m, k)?), bits_per_element)?;
    let b = tensor_bytes(pruned(elements(k, n)?), bits_per_element)?;
    let c = tensor_bytes(elements(m, n)?, bits_per_element)?;
    let meta = metadata_bytes(k, n, pruning.block_k, pruning.metadata_bits)?;
    [b, c, meta]
        .into_iter()
        .try_fold(a, |total, bytes| total.checked_add(bytes))
        .ok_or_else(|| eyre!("byte footprint of ({m}, {k}, {n}) overflows a u64"))
}
