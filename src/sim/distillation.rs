//! the distillation adjuster: shrinks an operation to the size of a smaller student network

use crate::settings::DistillationConfig;

/// scale `(m, k, n)` by the student factor, never below 1 per dimension.
/// returns the inputs unchanged when distillation is disabled.
pub fn apply_distillation(config: &DistillationConfig, m: u64, k: u64, n: u64) -> (u64, u64, u64) {
    if !config.enabled {
        return (m, k, n);
    }
    let scale = |dim: u64| ((dim as f64 * config.student_scale).floor() as u64).max(1);
    (scale(m), scale(k), scale(n))
}
