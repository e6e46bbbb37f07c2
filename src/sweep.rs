//! the pruning sweep: one large GEMM evaluated at several pruning levels
//!
//! memory energy is a dense, conservative estimate counted per element, so
//! the sweep isolates what pruning does to compute energy and accuracy.

use eyre::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    settings::{ArchConfig, SweepSettings},
    sim::{compute_array::ComputeArray, estimator::accuracy, workload::Operation},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub prune_frac: f64,
    pub cycles: u64,
    pub macs: u64,
    pub energy: f64,
    pub accuracy: f64,
    /// elements of the output matrix
    pub output: u64,
    pub energy_per_accuracy: f64,
    pub energy_per_output: f64,
    pub score: f64,
}

pub fn run_sweep(arch: &ArchConfig, sweep: &SweepSettings) -> Result<Vec<SweepRow>> {
    arch.validate().wrap_err("invalid arch config")?;
    let (m, k, n) = (sweep.m, sweep.k, sweep.n);
    ensure!(
        m > 0 && k > 0 && n > 0,
        "sweep dimensions must be positive: ({m}, {k}, {n})"
    );
    Operation::new("sweep", m, k, n).dense_macs()?;
    let precision = arch
        .precision(sweep.precision.unwrap_or(arch.default_precision))
        .wrap_err("cannot run the pruning sweep")?;
    let array = ComputeArray::new(arch);
    let energy_per_mac = arch.energy.per_mac_fp16 * precision.mac_energy_scale;
    let (mf, kf, nf) = (m as f64, k as f64, n as f64);
    let memory_energy = (mf * kf + kf * nf + mf * nf) * arch.energy.per_byte_dram;
    // fits, m * n never exceeds the checked m * k * n
    let output = m * n;

    sweep
        .prune_levels
        .iter()
        .map(|&prune_frac| {
            ensure!(
                prune_frac.is_finite() && (0.0..=1.0).contains(&prune_frac),
                "sweep pruning level must be in [0, 1], got {prune_frac}"
            );
            let (cycles, macs) = array.matmul(m, k, n, prune_frac, &precision);
            let energy = macs as f64 * energy_per_mac + memory_energy;
            let accuracy = accuracy(prune_frac, None);
            let energy_per_accuracy = energy / accuracy;
            let energy_per_output = energy / output as f64;
            let row = SweepRow {
                prune_frac,
                cycles,
                macs,
                energy,
                accuracy,
                output,
                energy_per_accuracy,
                energy_per_output,
                score: 1.0 / energy_per_accuracy + 1.0 / energy_per_output,
            };
            info!(prune_frac, macs, energy, score = row.score, "sweep level done");
            Ok(row)
        })
        .collect()
}
