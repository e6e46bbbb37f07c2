//! plain-text tables of run and sweep results

use std::fmt::Write;

use itertools::Itertools;

use crate::{result::RunResult, sweep::SweepRow};

const RULE_WIDTH: usize = 90;

/// `1234567` -> `1,234,567`
pub fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let bytes = digits.as_bytes();
    let head = bytes.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in bytes.iter().enumerate() {
        if i != 0 && (i + 3 - head) % 3 == 0 {
            out.push(',');
        }
        out.push(*c as char);
    }
    out
}

/// the comparison table, rows in the order given
pub fn comparison_table(results: &[RunResult]) -> String {
    let mut out = String::new();
    let rule = "-".repeat(RULE_WIDTH);
    writeln!(out, "Comparison Table:").ok();
    writeln!(out, "{rule}").ok();
    writeln!(
        out,
        "{:<22}{:>10}{:>12}{:>12}{:>14}{:>12}",
        "Method", "Cycles", "MACs", "Bytes", "Throughput", "Score"
    )
    .ok();
    writeln!(out, "{rule}").ok();
    for r in results {
        writeln!(
            out,
            "{:<22}{:>10}{:>12}{:>12}{:>14.2e}{:>12.4}",
            r.method,
            with_thousands(r.cycles),
            with_thousands(r.macs),
            with_thousands(r.bytes),
            r.throughput,
            r.score
        )
        .ok();
    }
    out
}

/// energy split, accuracy and roofline coordinates of every result
pub fn derived_table(results: &[RunResult]) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:<22}{:>14}{:>14}{:>10}{:>12}{:>12}{:>12}",
        "Method", "MAC Energy", "DRAM Energy", "Accuracy", "MACs/Byte", "MACs/Cycle", "Mem Bound"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(RULE_WIDTH + 6)).ok();
    for r in results {
        writeln!(
            out,
            "{:<22}{:>14.2e}{:>14.2e}{:>10.3}{:>12.3}{:>12.3}{:>12}",
            r.method,
            r.mac_energy,
            r.dram_energy,
            r.accuracy,
            r.arithmetic_intensity(),
            r.macs_per_cycle(),
            format!("{}/{}", r.memory_bound_ops(), r.ops.len())
        )
        .ok();
    }
    out
}

pub fn sweep_table(rows: &[SweepRow]) -> String {
    let header = ["Prune %", "MACs", "Energy", "Accuracy", "Output", "E/Acc", "E/Out", "Score"]
        .iter()
        .map(|h| format!("{h:>16}"))
        .join("");
    let body = rows
        .iter()
        .map(|row| {
            format!(
                "{:>16}{:>16}{:>16.2}{:>16.2}{:>16}{:>16.2}{:>16.2}{:>16.2}",
                (row.prune_frac * 100.0).round() as i64,
                with_thousands(row.macs),
                row.energy,
                row.accuracy,
                with_thousands(row.output),
                row.energy_per_accuracy,
                row.energy_per_output,
                row.score
            )
        })
        .join("\n");
    format!("{header}\n{body}\n")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        settings::ArchConfig,
        sim::{estimator::default_methods, evaluate, workload::default_workload},
    };
    use eyre::Result;

    #[test]
    fn thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(1000), "1,000");
        assert_eq!(with_thousands(29_492), "29,492");
        assert_eq!(with_thousands(1_887_436), "1,887,436");
    }

    #[test]
    fn table_has_a_row_per_method() -> Result<()> {
        let arch = ArchConfig::default();
        let workload = default_workload();
        let results = default_methods()
            .iter()
            .map(|method| evaluate(&arch, method, &workload))
            .collect::<Result<Vec<_>>>()?;
        let table = comparison_table(&results);
        assert_eq!(table.lines().count(), 4 + results.len());
        assert!(table.contains("KD 50% + INT4"));
        let derived = derived_table(&results);
        assert_eq!(derived.lines().count(), 2 + results.len());
        Ok(())
    }
}
