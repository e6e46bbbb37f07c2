use std::path::PathBuf;

use accel_est::{report, result::Results};
use eyre::Result;
use itertools::Itertools;

fn main() -> Result<()> {
    let result_file: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| "results/estimate.json".into());
    let mut results = Results::load_from_file(&result_file)?;
    results.sort_by_score();
    println!("{}", report::comparison_table(&results.all));
    println!("{}", report::derived_table(&results.all));

    // per-op bottlenecks of the best method
    if let Some(best) = results.all.first() {
        println!("Bottlenecks of {}:", best.method);
        let ops = best
            .ops
            .iter()
            .map(|op| {
                format!(
                    "  {:<20} {:>4}x{:>4}x{:>4} {:?} bound ({} compute / {} memory cycles)",
                    op.name, op.m, op.k, op.n, op.bound, op.compute_cycles, op.memory_cycles
                )
            })
            .join("\n");
        println!("{ops}");
    }
    Ok(())
}
