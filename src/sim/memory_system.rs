//! the memory timing model: a single fixed-bandwidth DRAM channel

use crate::settings::ArchConfig;

#[derive(Debug, Clone)]
pub struct MemorySystem {
    bytes_per_cycle: f64,
    /// extra cycles charged per transfer, 0 unless `model_dram_latency` is set
    latency_cycles: u64,
}

impl MemorySystem {
    pub fn new(arch: &ArchConfig) -> Self {
        let latency_cycles = if arch.model_dram_latency {
            (arch.dram_latency_ns * arch.clock_hz as f64 / 1e9).ceil() as u64
        } else {
            0
        };
        Self {
            bytes_per_cycle: arch.dram_bandwidth_bytes_per_sec / arch.clock_hz as f64,
            latency_cycles,
        }
    }

    pub fn bytes_per_cycle(&self) -> f64 {
        self.bytes_per_cycle
    }

    /// cycles to move `byte_count` bytes, at least one
    pub fn transfer_cycles(&self, byte_count: u64) -> u64 {
        let cycles = ((byte_count as f64 / self.bytes_per_cycle).ceil() as u64).max(1);
        cycles.saturating_add(self.latency_cycles)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn arch_with_bandwidth(bandwidth: f64) -> ArchConfig {
        ArchConfig {
            dram_bandwidth_bytes_per_sec: bandwidth,
            ..Default::default()
        }
    }

    #[test]
    fn default_channel_is_narrow() {
        let memory = MemorySystem::new(&ArchConfig::default());
        assert!((memory.bytes_per_cycle() - 0.2).abs() < 1e-12);
        assert_eq!(memory.transfer_cycles(3), 15);
    }

    #[test]
    fn floor_of_one_cycle() {
        let memory = MemorySystem::new(&arch_with_bandwidth(64e9));
        assert_eq!(memory.transfer_cycles(0), 1);
        assert_eq!(memory.transfer_cycles(1), 1);
        assert_eq!(memory.transfer_cycles(64), 1);
        assert_eq!(memory.transfer_cycles(65), 2);
    }

    #[test]
    fn latency_is_additive_when_enabled() {
        let arch = ArchConfig {
            model_dram_latency: true,
            dram_latency_ns: 100.0,
            ..arch_with_bandwidth(1e9)
        };
        let memory = MemorySystem::new(&arch);
        // 100ns at 1GHz
        assert_eq!(memory.transfer_cycles(0), 101);
        assert_eq!(memory.transfer_cycles(1000), 1100);
    }
}
