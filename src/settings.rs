use std::{collections::BTreeMap, path::PathBuf};

use config::Config;
use eyre::{ensure, eyre, Context, Result};
use serde::{Deserialize, Serialize};

use crate::sim::{
    estimator::{default_methods, Method},
    precision::{deserialize_table, serialize_table, Precision, PrecisionParams},
    workload::{default_workload, Operation},
};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PruningConfig {
    /// rows along `k` sharing one metadata entry
    pub block_k: u64,
    /// fraction of the pruned work the hardware actually skips
    pub efficiency: f64,
    pub metadata_bits: u32,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            block_k: 8,
            efficiency: 0.9,
            metadata_bits: 1,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DistillationConfig {
    pub enabled: bool,
    pub student_scale: f64,
}

impl Default for DistillationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            student_scale: 1.0,
        }
    }
}

/// normalized, unit-free energy constants
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnergyConfig {
    pub per_mac_fp16: f64,
    pub per_byte_dram: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            per_mac_fp16: 1.0,
            per_byte_dram: 10.0,
        }
    }
}

/// the accelerator being modeled.
/// one value is one immutable configuration snapshot, each method gets its own copy.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ArchConfig {
    pub clock_hz: u64,
    pub mac_units: u64,
    pub dram_bandwidth_bytes_per_sec: f64,
    pub dram_latency_ns: f64,
    /// charge `dram_latency_ns` on every transfer
    pub model_dram_latency: bool,
    pub default_precision: Precision,
    #[serde(serialize_with = "serialize_table", deserialize_with = "deserialize_table")]
    pub bits_per_element: BTreeMap<Precision, u32>,
    #[serde(serialize_with = "serialize_table", deserialize_with = "deserialize_table")]
    pub compute_density_scale: BTreeMap<Precision, f64>,
    #[serde(serialize_with = "serialize_table", deserialize_with = "deserialize_table")]
    pub mac_energy_scale: BTreeMap<Precision, f64>,
    pub pruning: PruningConfig,
    pub distillation: DistillationConfig,
    pub energy: EnergyConfig,
}

impl Default for ArchConfig {
    fn default() -> Self {
        use Precision::*;
        Self {
            clock_hz: 1_000_000_000,
            mac_units: 64,
            dram_bandwidth_bytes_per_sec: 200e6,
            dram_latency_ns: 100.0,
            model_dram_latency: false,
            default_precision: Fp16,
            bits_per_element: BTreeMap::from([(Fp16, 16), (Int9, 9), (Int8, 8), (Int4, 4)]),
            compute_density_scale: BTreeMap::from([(Fp16, 1.0), (Int8, 2.0), (Int4, 4.0)]),
            mac_energy_scale: BTreeMap::from([(Fp16, 1.0), (Int8, 0.25), (Int4, 0.0625)]),
            pruning: PruningConfig::default(),
            distillation: DistillationConfig::default(),
            energy: EnergyConfig::default(),
        }
    }
}

impl ArchConfig {
    /// resolve every per-precision table entry, failing on the first missing one
    pub fn precision(&self, precision: Precision) -> Result<PrecisionParams> {
        let missing = |table: &str| eyre!("precision {precision} has no entry in `{table}`");
        Ok(PrecisionParams {
            precision,
            bits_per_element: *self
                .bits_per_element
                .get(&precision)
                .ok_or_else(|| missing("bits_per_element"))?,
            density_scale: *self
                .compute_density_scale
                .get(&precision)
                .ok_or_else(|| missing("compute_density_scale"))?,
            mac_energy_scale: *self
                .mac_energy_scale
                .get(&precision)
                .ok_or_else(|| missing("mac_energy_scale"))?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.clock_hz > 0, "clock_hz must be positive");
        ensure!(self.mac_units > 0, "mac_units must be positive");
        ensure!(
            self.dram_bandwidth_bytes_per_sec > 0.0,
            "dram_bandwidth_bytes_per_sec must be positive"
        );
        ensure!(
            self.dram_latency_ns >= 0.0,
            "dram_latency_ns must not be negative"
        );
        ensure!(self.pruning.block_k > 0, "pruning.block_k must be positive");
        ensure!(
            self.pruning.efficiency > 0.0 && self.pruning.efficiency <= 1.0,
            "pruning.efficiency must be in (0, 1], got {}",
            self.pruning.efficiency
        );
        ensure!(
            self.distillation.student_scale > 0.0 && self.distillation.student_scale <= 1.0,
            "distillation.student_scale must be in (0, 1], got {}",
            self.distillation.student_scale
        );
        ensure!(
            self.energy.per_mac_fp16 > 0.0 && self.energy.per_byte_dram > 0.0,
            "energy constants must be positive"
        );
        for (table, scales) in [
            ("compute_density_scale", &self.compute_density_scale),
            ("mac_energy_scale", &self.mac_energy_scale),
        ] {
            for (precision, scale) in scales {
                ensure!(*scale > 0.0, "{table}.{precision} must be positive");
            }
        }
        Ok(())
    }

    /// the snapshot one method is evaluated against
    pub fn for_method(&self, method: &Method) -> ArchConfig {
        let mut snapshot = self.clone();
        if let Some(scale) = method.kd_scale {
            snapshot.distillation.student_scale = scale;
        }
        snapshot
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).wrap_err("fail to serialize arch config")
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SweepSettings {
    pub m: u64,
    pub k: u64,
    pub n: u64,
    pub prune_levels: Vec<f64>,
    /// falls back to `arch.default_precision`
    pub precision: Option<Precision>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            m: 1024,
            k: 1024,
            n: 1024,
            prune_levels: vec![0.5],
            precision: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    pub arch: ArchConfig,
    pub methods: Vec<Method>,
    pub workload: Vec<Operation>,
    pub sweep: SweepSettings,
    pub result_file: PathBuf,
    pub plot_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arch: ArchConfig::default(),
            methods: default_methods(),
            workload: default_workload(),
            sweep: SweepSettings::default(),
            result_file: "results/estimate.json".into(),
            plot_dir: None,
        }
    }
}

impl Settings {
    /// layer the config files in order, later files override earlier ones
    pub fn new(config_files: &[PathBuf]) -> Result<Self> {
        let mut builder = Config::builder();
        for config in config_files {
            let name = config.to_str().ok_or(eyre!("Invalid path"))?;
            builder = builder.add_source(config::File::with_name(name));
        }
        let settings: Settings = builder
            .build()
            .wrap_err("cannot build Setting object")?
            .try_deserialize()
            .wrap_err("failed to deserialize")?;
        settings.arch.validate().wrap_err("invalid arch config")?;
        Ok(settings)
    }
}
