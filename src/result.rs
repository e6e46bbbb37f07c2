use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sim::precision::Precision;

/// which resource set the cycles of an operation
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Compute,
    Memory,
}

/// one operation as it was actually evaluated
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OpResult {
    pub name: String,
    /// dimensions after distillation
    pub m: u64,
    pub k: u64,
    pub n: u64,
    /// the operation's own pruning fraction, which sized `bytes`
    pub prune_frac: f64,
    pub bytes: u64,
    pub macs: u64,
    pub compute_cycles: u64,
    pub memory_cycles: u64,
    pub cycles: u64,
    pub bound: Bound,
}

/// the estimate of one method over the whole workload
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunResult {
    pub method: String,
    pub precision: Precision,
    pub prune_frac: f64,
    pub kd_scale: Option<f64>,
    pub cycles: u64,
    pub macs: u64,
    pub bytes: u64,
    /// MACs per second
    pub throughput: f64,
    pub score: f64,
    pub energy: f64,
    pub mac_energy: f64,
    pub dram_energy: f64,
    pub accuracy: f64,
    pub ops: Vec<OpResult>,
}

impl RunResult {
    /// MACs per byte moved
    pub fn arithmetic_intensity(&self) -> f64 {
        self.macs as f64 / self.bytes as f64
    }

    pub fn macs_per_cycle(&self) -> f64 {
        self.macs as f64 / self.cycles as f64
    }

    pub fn bytes_per_cycle(&self) -> f64 {
        self.bytes as f64 / self.cycles as f64
    }

    pub fn memory_bound_ops(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| op.bound == Bound::Memory)
            .count()
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Results {
    pub all: Vec<RunResult>,
}

impl Results {
    /// highest score first
    pub fn sort_by_score(&mut self) {
        self.all
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    }

    pub fn save_to_file(&self, filename: &Path) -> Result<()> {
        // create dir first
        if let Some(parent) = filename.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(filename.with_extension("json"))
            .wrap_err("fail to create json file")?;
        serde_json::to_writer_pretty(&mut file, self).wrap_err("fail to write json file")?;
        Ok(())
    }

    pub fn load_from_file(filename: &Path) -> Result<Self> {
        let file = std::fs::File::open(filename)
            .wrap_err(format!("fail to open result file {:?}", filename))?;
        serde_json::from_reader(file).wrap_err("fail to parse result file")
    }
}

/// write the names of the succeeded and failed methods next to `filename`
pub fn save_result_list<T: AsRef<str> + Serialize>(
    ok_list: &[T],
    err_list: &[T],
    filename: &Path,
) -> Result<()> {
    let mut file = std::fs::File::create(filename.with_extension("ok.json"))?;
    serde_json::to_writer_pretty(&mut file, ok_list)?;
    let mut file = std::fs::File::create(filename.with_extension("err.json"))?;
    serde_json::to_writer_pretty(&mut file, err_list)?;
    Ok(())
}
