//! the compute-array timing model
//! - a fixed grid of MAC units, each packing more MACs per cycle at lower precision
//! - sparsity is exploited imperfectly (the pruning efficiency factor)
//! - small operations cannot fill the array (the utilization curve)

use tracing::debug;

use super::{precision::PrecisionParams, pruning::surviving_fraction};
use crate::settings::ArchConfig;

/// operations with at least this many dense MACs saturate the array
pub const SATURATION_MACS: f64 = 1e6;

#[derive(Debug, Clone)]
pub struct ComputeArray {
    base_macs_per_cycle: u64,
    pruning_efficiency: f64,
}

impl ComputeArray {
    pub fn new(arch: &ArchConfig) -> Self {
        Self {
            base_macs_per_cycle: arch.mac_units,
            pruning_efficiency: arch.pruning.efficiency,
        }
    }

    /// dense MACs as a float, exact below 2^53 and never overflowing
    fn volume(m: u64, k: u64, n: u64) -> f64 {
        m as f64 * k as f64 * n as f64
    }

    /// fraction of the array an `m x k x n` matmul can keep busy
    pub fn utilization(m: u64, k: u64, n: u64) -> f64 {
        (Self::volume(m, k, n) / SATURATION_MACS).min(1.0)
    }

    /// surviving MACs of the matmul after pruning and the efficiency discount,
    /// saturating at `u64::MAX`
    pub fn effective_macs(&self, m: u64, k: u64, n: u64, prune_frac: f64) -> u64 {
        (Self::volume(m, k, n) * surviving_fraction(prune_frac) * self.pruning_efficiency).floor()
            as u64
    }

    /// MACs retired per cycle for this operation shape and precision
    pub fn macs_per_cycle(&self, m: u64, k: u64, n: u64, precision: &PrecisionParams) -> f64 {
        self.base_macs_per_cycle as f64 * precision.density_scale * Self::utilization(m, k, n)
    }

    /// return `(cycles, macs)` of one matmul, at least one cycle for dispatch
    pub fn matmul(
        &self,
        m: u64,
        k: u64,
        n: u64,
        prune_frac: f64,
        precision: &PrecisionParams,
    ) -> (u64, u64) {
        let macs = self.effective_macs(m, k, n, prune_frac);
        let throughput = self.macs_per_cycle(m, k, n, precision);
        let cycles = ((macs as f64 / throughput).ceil() as u64).max(1);
        debug!(m, k, n, prune_frac, macs, cycles, "matmul");
        (cycles, macs)
    }
}
