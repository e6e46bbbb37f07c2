use accel_est::{
    settings::ArchConfig,
    sim::{estimator::default_methods, evaluate, workload::default_workload},
};
use eyre::Result;
use itertools::Itertools;
use rayon::prelude::*;

/// every point of a small hardware grid keeps the cost floors and the roofline
#[test]
fn grid_keeps_invariants() -> Result<()> {
    let mac_units = [16u64, 64, 256, 1024];
    let bandwidths = [200e6, 2e9, 20e9, 200e9];
    let workload = default_workload();
    let methods = default_methods();

    mac_units
        .into_iter()
        .cartesian_product(bandwidths)
        .par_bridge()
        .try_for_each(|(mac_units, bandwidth)| -> Result<()> {
            let arch = ArchConfig {
                mac_units,
                dram_bandwidth_bytes_per_sec: bandwidth,
                ..Default::default()
            };
            for method in &methods {
                let result = evaluate(&arch, method, &workload)?;
                for op in &result.ops {
                    assert!(op.compute_cycles >= 1);
                    assert!(op.memory_cycles >= 1);
                    assert_eq!(op.cycles, op.compute_cycles.max(op.memory_cycles));
                }
                assert!(result.energy > 0.0);
                assert!(result.score > 0.0);
            }
            Ok(())
        })
}

/// more MAC units never slow an operation down
#[test]
fn wider_array_is_never_slower() -> Result<()> {
    let workload = default_workload();
    for method in default_methods() {
        let cycles = [16u64, 64, 256]
            .into_iter()
            .map(|mac_units| {
                let arch = ArchConfig {
                    mac_units,
                    ..Default::default()
                };
                evaluate(&arch, &method, &workload).map(|r| r.cycles)
            })
            .collect::<Result<Vec<_>>>()?;
        assert!(cycles.windows(2).all(|w| w[1] <= w[0]));
    }
    Ok(())
}
