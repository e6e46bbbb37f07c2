//! the run aggregator: evaluates one method over a whole workload
//!
//! every operation is costed as `max(compute cycles, memory cycles)`, compute
//! and transfer are assumed to overlap perfectly. energy, accuracy, throughput
//! and the score are derived from the totals.
//!
//! [`evaluate`] is a pure function of its inputs, the [`ArchConfig`] it gets
//! is never mutated so methods can be evaluated in parallel.

use eyre::{ensure, eyre, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

use super::{
    compute_array::ComputeArray, distillation::apply_distillation, memory_system::MemorySystem,
    precision::Precision, workload::matmul_bytes, workload::Operation,
};
use crate::{
    result::{Bound, OpResult, RunResult},
    settings::ArchConfig,
};

pub const BASELINE_ACCURACY: f64 = 1.0;
pub const MIN_ACCURACY: f64 = 0.1;
/// exponent of the accuracy loss curve, small pruning costs little
pub const PRUNE_DEGRADATION_EXP: f64 = 2.2;
/// display scaling of accuracy per energy
pub const SCORE_SCALE: f64 = 1e7;

/// an efficiency method: quantization, pruning, distillation or a mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub prune_frac: f64,
    /// student/teacher size ratio, `None` runs the full model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kd_scale: Option<f64>,
    pub precision: Precision,
}

impl Method {
    pub fn new(name: impl Into<String>, precision: Precision) -> Self {
        Self {
            name: name.into(),
            prune_frac: 0.0,
            kd_scale: None,
            precision,
        }
    }

    pub fn with_prune_frac(mut self, prune_frac: f64) -> Self {
        self.prune_frac = prune_frac;
        self
    }

    pub fn with_kd_scale(mut self, kd_scale: f64) -> Self {
        self.kd_scale = Some(kd_scale);
        self
    }
}

pub fn default_methods() -> Vec<Method> {
    vec![
        Method::new("Default FP16", Precision::Fp16),
        Method::new("Quant INT8", Precision::Int8),
        Method::new("Quant INT4", Precision::Int4),
        Method::new("KD 50% + INT4", Precision::Int4).with_kd_scale(0.5),
        Method::new("Prune 50% FP16", Precision::Fp16).with_prune_frac(0.5),
    ]
}

fn check_prune_frac(prune_frac: f64, what: &str) -> Result<()> {
    ensure!(
        prune_frac.is_finite() && (0.0..=1.0).contains(&prune_frac),
        "{what}: pruning fraction must be in [0, 1], got {prune_frac}"
    );
    Ok(())
}

/// accuracy left after pruning `prune_frac` of the weights and optionally distilling
pub fn accuracy(prune_frac: f64, kd_scale: Option<f64>) -> f64 {
    let pruned = if prune_frac > 0.0 {
        (BASELINE_ACCURACY - prune_frac.powf(PRUNE_DEGRADATION_EXP)).max(MIN_ACCURACY)
    } else {
        BASELINE_ACCURACY
    };
    match kd_scale {
        Some(scale) => pruned * scale,
        None => pruned,
    }
}

fn add(total: u64, value: u64, what: &str) -> Result<u64> {
    total
        .checked_add(value)
        .ok_or_else(|| eyre!("total {what} of the workload overflow a u64"))
}

/// evaluate `method` over `workload` against the base configuration `arch`.
///
/// an operation's own `prune_frac` sizes the bytes it moves, the method's
/// `prune_frac` sets how many MACs the array skips.
pub fn evaluate(arch: &ArchConfig, method: &Method, workload: &[Operation]) -> Result<RunResult> {
    let span = tracing::span!(Level::INFO, "evaluate", method = %method.name);
    let _entered = span.enter();

    arch.validate().wrap_err("invalid arch config")?;
    ensure!(!workload.is_empty(), "the workload is empty");
    check_prune_frac(method.prune_frac, &method.name)?;
    if let Some(scale) = method.kd_scale {
        ensure!(
            scale > 0.0 && scale <= 1.0,
            "{}: kd_scale must be in (0, 1], got {scale}",
            method.name
        );
    }

    let arch = arch.for_method(method);
    let precision = arch
        .precision(method.precision)
        .wrap_err(format!("cannot evaluate method {}", method.name))?;
    let array = ComputeArray::new(&arch);
    let memory = MemorySystem::new(&arch);

    let mut total_cycles = 0u64;
    let mut total_macs = 0u64;
    let mut total_bytes = 0u64;
    let mut ops = Vec::with_capacity(workload.len());
    for op in workload {
        ensure!(
            op.m > 0 && op.k > 0 && op.n > 0,
            "operation {:?} has a zero dimension: ({}, {}, {})",
            op.name,
            op.m,
            op.k,
            op.n
        );
        check_prune_frac(op.prune_frac, &op.name)?;
        op.dense_macs()?;

        let (m, k, n) = if method.kd_scale.is_some() {
            apply_distillation(&arch.distillation, op.m, op.k, op.n)
        } else {
            (op.m, op.k, op.n)
        };
        let bytes = matmul_bytes(
            m,
            k,
            n,
            precision.bits_per_element,
            op.prune_frac,
            &arch.pruning,
        )
        .wrap_err(format!("cannot size operation {:?}", op.name))?;

        let (compute_cycles, macs) = array.matmul(m, k, n, method.prune_frac, &precision);
        let memory_cycles = memory.transfer_cycles(bytes);
        let (cycles, bound) = if compute_cycles >= memory_cycles {
            (compute_cycles, Bound::Compute)
        } else {
            (memory_cycles, Bound::Memory)
        };
        debug!(op = %op.name, compute_cycles, memory_cycles, bytes, ?bound, "op done");

        total_cycles = add(total_cycles, cycles, "cycles")?;
        total_macs = add(total_macs, macs, "MACs")?;
        total_bytes = add(total_bytes, bytes, "bytes")?;
        ops.push(OpResult {
            name: op.name.clone(),
            m,
            k,
            n,
            prune_frac: op.prune_frac,
            bytes,
            macs,
            compute_cycles,
            memory_cycles,
            cycles,
            bound,
        });
    }

    let mac_energy = total_macs as f64 * arch.energy.per_mac_fp16 * precision.mac_energy_scale;
    let dram_energy = total_bytes as f64 * arch.energy.per_byte_dram;
    let energy = mac_energy + dram_energy;

    let accuracy = accuracy(method.prune_frac, method.kd_scale);
    let score = (accuracy / energy) * SCORE_SCALE;
    let throughput = total_macs as f64 / (total_cycles as f64 / arch.clock_hz as f64);

    info!(
        cycles = total_cycles,
        macs = total_macs,
        bytes = total_bytes,
        energy,
        accuracy,
        score,
        "evaluate done"
    );
    Ok(RunResult {
        method: method.name.clone(),
        precision: method.precision,
        prune_frac: method.prune_frac,
        kd_scale: method.kd_scale,
        cycles: total_cycles,
        macs: total_macs,
        bytes: total_bytes,
        throughput,
        score,
        energy,
        mac_energy,
        dram_energy,
        accuracy,
        ops,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::workload::default_workload;
    use crate::utils::init_log;

    fn single(m: u64, k: u64, n: u64) -> Vec<Operation> {
        vec![Operation::new("single", m, k, n)]
    }

    #[test]
    fn fp16_128_cube() -> Result<()> {
        init_log("debug");
        let arch = ArchConfig::default();
        let result = evaluate(
            &arch,
            &Method::new("fp16", Precision::Fp16),
            &single(128, 128, 128),
        )?;
        let op = &result.ops[0];
        assert_eq!(op.macs, 1_887_436);
        assert_eq!(op.compute_cycles, 29_492);
        // 2 inputs + output at 2 bytes each, 16 blocks * 128 cols of metadata
        assert_eq!(op.bytes, 3 * 128 * 128 * 2 + 256);
        assert_eq!(op.bound, Bound::Memory);
        assert_eq!(result.cycles, op.memory_cycles);
        assert_eq!(result.accuracy, 1.0);
        assert_eq!(result.mac_energy, 1_887_436.0);
        assert_eq!(result.dram_energy, op.bytes as f64 * 10.0);
        assert_eq!(result.energy, result.mac_energy + result.dram_energy);
        assert_eq!(result.score, 1.0 / result.energy * 1e7);
        Ok(())
    }

    #[test]
    fn fully_pruned() -> Result<()> {
        let arch = ArchConfig::default();
        let method = Method::new("prune all", Precision::Fp16).with_prune_frac(1.0);
        let result = evaluate(&arch, &method, &single(64, 64, 64))?;
        assert_eq!(result.macs, 0);
        assert_eq!(result.ops[0].compute_cycles, 1);
        assert_eq!(result.accuracy, 0.1);
        assert_eq!(result.mac_energy, 0.0);
        Ok(())
    }

    #[test]
    fn int4_beats_fp16() -> Result<()> {
        let arch = ArchConfig::default();
        let workload = single(128, 128, 128);
        let fp16 = evaluate(&arch, &Method::new("fp16", Precision::Fp16), &workload)?;
        let int4 = evaluate(&arch, &Method::new("int4", Precision::Int4), &workload)?;
        assert!(int4.ops[0].compute_cycles < fp16.ops[0].compute_cycles);
        assert!(int4.mac_energy < fp16.mac_energy);
        assert_eq!(int4.macs, fp16.macs);
        Ok(())
    }

    #[test]
    fn evaluate_is_idempotent() -> Result<()> {
        let arch = ArchConfig::default();
        let workload = default_workload();
        for method in default_methods() {
            let first = evaluate(&arch, &method, &workload)?;
            let second = evaluate(&arch, &method, &workload)?;
            assert_eq!(serde_json::to_string(&first)?, serde_json::to_string(&second)?);
        }
        Ok(())
    }

    #[test]
    fn more_pruning_never_helps_accuracy_or_adds_macs() -> Result<()> {
        let arch = ArchConfig::default();
        let workload = default_workload();
        let mut last: Option<RunResult> = None;
        for step in 0..=20 {
            let method =
                Method::new("sweep", Precision::Int8).with_prune_frac(step as f64 / 20.0);
            let result = evaluate(&arch, &method, &workload)?;
            if let Some(last) = &last {
                assert!(result.macs <= last.macs);
                assert!(result.accuracy <= last.accuracy);
                assert_eq!(result.bytes, last.bytes);
            }
            last = Some(result);
        }
        Ok(())
    }

    #[test]
    fn distillation_applies_once() -> Result<()> {
        let arch = ArchConfig::default();
        let method = Method::new("kd", Precision::Int4).with_kd_scale(0.5);
        let result = evaluate(&arch, &method, &single(128, 128, 128))?;
        let op = &result.ops[0];
        assert_eq!((op.m, op.k, op.n), (64, 64, 64));
        assert_eq!(op.macs, (64.0f64 * 64.0 * 64.0 * 0.9).floor() as u64);
        assert_eq!(result.accuracy, 0.5);
        Ok(())
    }

    #[test]
    fn disabled_distillation_keeps_dims_but_not_accuracy() -> Result<()> {
        let mut arch = ArchConfig::default();
        arch.distillation.enabled = false;
        let method = Method::new("kd", Precision::Int4).with_kd_scale(0.5);
        let result = evaluate(&arch, &method, &single(128, 128, 128))?;
        assert_eq!(result.ops[0].m, 128);
        assert_eq!(result.accuracy, 0.5);
        Ok(())
    }

    #[test]
    fn method_pruning_leaves_bytes_alone() -> Result<()> {
        let arch = ArchConfig::default();
        let workload = default_workload();
        let dense = evaluate(&arch, &Method::new("dense", Precision::Fp16), &workload)?;
        let pruned = Method::new("pruned", Precision::Fp16).with_prune_frac(0.5);
        let pruned = evaluate(&arch, &pruned, &workload)?;
        assert_eq!(dense.bytes, 561_120);
        assert_eq!(pruned.bytes, dense.bytes);
        assert_eq!(pruned.dram_energy, dense.dram_energy);
        assert!(pruned.macs < dense.macs);
        assert!((pruned.score - 0.5428).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn op_sparsity_only_shrinks_bytes() -> Result<()> {
        let arch = ArchConfig::default();
        let dense_op = vec![Operation::new("dense", 128, 128, 128)];
        let sparse_op = vec![Operation::new("sparse", 128, 128, 128).with_prune_frac(0.75)];
        let fp16 = Method::new("m", Precision::Fp16);
        let dense = evaluate(&arch, &fp16, &dense_op)?;
        let sparse = evaluate(&arch, &fp16, &sparse_op)?;
        assert_eq!(sparse.ops[0].prune_frac, 0.75);
        assert_eq!(sparse.macs, 1_887_436);
        assert_eq!(sparse.macs, dense.macs);
        assert_eq!(sparse.accuracy, 1.0);
        // inputs shrink to a quarter, output and metadata stay
        let inputs = 2 * 128 * 128 * 2;
        assert_eq!(dense.bytes - sparse.bytes, inputs - inputs / 4);
        Ok(())
    }

    #[test]
    fn huge_operation_is_an_error() {
        let arch = ArchConfig::default();
        let huge = vec![Operation::new("huge", 3_000_000, 3_000_000, 3_000_000)];
        let err = evaluate(&arch, &Method::new("fp16", Precision::Fp16), &huge).unwrap_err();
        assert!(format!("{err:?}").contains("too large"));
    }

    #[test]
    fn large_operation_fits() -> Result<()> {
        let arch = ArchConfig::default();
        let large = vec![Operation::new("large", 2_000_000, 2_000_000, 2_000)];
        let result = evaluate(&arch, &Method::new("int8", Precision::Int8), &large)?;
        assert_eq!(result.macs, (8e15f64 * 0.9).floor() as u64);
        assert_eq!(result.ops[0].compute_cycles, 56_250_000_000_000);
        assert_eq!(result.ops[0].bound, Bound::Compute);
        Ok(())
    }

    #[test]
    fn invalid_arch_is_rejected() {
        let fp16 = Method::new("fp16", Precision::Fp16);
        let workload = single(64, 64, 64);
        let no_units = ArchConfig {
            mac_units: 0,
            ..Default::default()
        };
        assert!(evaluate(&no_units, &fp16, &workload).is_err());
        let mut no_density = ArchConfig::default();
        no_density.compute_density_scale.insert(Precision::Fp16, 0.0);
        assert!(evaluate(&no_density, &fp16, &workload).is_err());
        let mut free_dram = ArchConfig::default();
        free_dram.energy.per_byte_dram = 0.0;
        let prune_all = fp16.clone().with_prune_frac(1.0);
        assert!(evaluate(&free_dram, &prune_all, &workload).is_err());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let arch = ArchConfig::default();
        let fp16 = Method::new("fp16", Precision::Fp16);
        assert!(evaluate(&arch, &fp16, &[]).is_err());
        assert!(evaluate(&arch, &fp16, &single(0, 8, 8)).is_err());
        let negative = fp16.clone().with_prune_frac(-0.1);
        assert!(evaluate(&arch, &negative, &single(8, 8, 8)).is_err());
        let too_much = fp16.clone().with_prune_frac(1.5);
        assert!(evaluate(&arch, &too_much, &single(8, 8, 8)).is_err());
        let nan = vec![Operation::new("nan", 8, 8, 8).with_prune_frac(f64::NAN)];
        assert!(evaluate(&arch, &fp16, &nan).is_err());
    }

    #[test]
    fn unknown_precision_fails_the_run() {
        let arch = ArchConfig::default();
        let err = evaluate(
            &arch,
            &Method::new("int9", Precision::Int9),
            &single(8, 8, 8),
        )
        .unwrap_err();
        assert!(format!("{err:?}").contains("compute_density_scale"));
    }

    #[test]
    fn accuracy_curve() {
        assert_eq!(accuracy(0.0, None), 1.0);
        assert!((accuracy(0.5, None) - (1.0 - 0.5f64.powf(2.2))).abs() < 1e-15);
        assert_eq!(accuracy(1.0, None), 0.1);
        assert_eq!(accuracy(1.0, Some(0.5)), 0.05);
        assert_eq!(accuracy(0.0, Some(0.5)), 0.5);
    }

    #[test]
    fn throughput_from_cycles() -> Result<()> {
        let arch = ArchConfig::default();
        let result = evaluate(
            &arch,
            &Method::new("fp16", Precision::Fp16),
            &default_workload(),
        )?;
        let expected = result.macs as f64 / (result.cycles as f64 / 1e9);
        assert_eq!(result.throughput, expected);
        assert_eq!(result.ops.len(), 5);
        assert_eq!(result.cycles, result.ops.iter().map(|op| op.cycles).sum::<u64>());
        Ok(())
    }
}
