use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, Result};
use crate::specs::GpuSpec;

/// Which roof limits the workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bottleneck {
    MemoryBound,
    ComputeBound,
}

impl Bottleneck {
    pub const fn is_memory_bound(self) -> bool {
        matches!(self, Self::MemoryBound)
    }

    pub const fn is_compute_bound(self) -> bool {
        matches!(self, Self::ComputeBound)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MemoryBound => "memory-bound",
            Self::ComputeBound => "compute-bound",
        }
    }
}

impl fmt::Display for Bottleneck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hardware ridge point: FLOP/s over byte/s
pub fn compute_ops_to_byte_ratio(gpu: &GpuSpec) -> Result<f64> {
    gpu.validate()?;
    Ok(gpu.compute_flops_per_sec() / gpu.memory_bytes_per_sec())
}

/// Workloads at or above the ridge point are compute-bound
pub fn classify_bottleneck(ops_to_byte_ratio: f64, intensity: f64) -> Bottleneck {
    if intensity >= ops_to_byte_ratio {
        Bottleneck::ComputeBound
    } else {
        Bottleneck::MemoryBound
    }
}

/// Roofline ceiling in TFLOP/s at the given intensity
pub fn attainable_tflops(gpu: &GpuSpec, intensity: f64) -> Result<f64> {
    gpu.validate()?;
    require_positive("intensity", intensity)?;
    let bandwidth_bound = gpu.memory_bytes_per_sec() * intensity / 1e12;
    Ok(bandwidth_bound.min(gpu.compute_tflops))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t4() -> GpuSpec {
        GpuSpec::new("T4", 65.0, 300.0, 16.0)
    }

    #[test]
    fn test_t4_ops_to_byte() {
        let ratio = compute_ops_to_byte_ratio(&t4()).unwrap();
        assert!((ratio - 216.666_666).abs() < 1e-3);
    }

    #[test]
    fn test_zero_bandwidth_is_rejected() {
        let gpu = GpuSpec::new("broken", 65.0, 0.0, 16.0);
        assert!(compute_ops_to_byte_ratio(&gpu).is_err());
    }

    #[test]
    fn test_tie_counts_as_compute_bound() {
        assert_eq!(classify_bottleneck(200.0, 200.0), Bottleneck::ComputeBound);
        assert_eq!(classify_bottleneck(200.0, 199.9), Bottleneck::MemoryBound);
        assert_eq!(classify_bottleneck(200.0, 500.0), Bottleneck::ComputeBound);
    }

    #[test]
    fn test_flags_are_exclusive() {
        for bottleneck in [Bottleneck::MemoryBound, Bottleneck::ComputeBound] {
            assert!(bottleneck.is_memory_bound() ^ bottleneck.is_compute_bound());
        }
    }

    #[test]
    fn test_attainable_performance() {
        // memory roof: 300 GB/s * 10 FLOP/B = 3 TFLOP/s
        let low = attainable_tflops(&t4(), 10.0).unwrap();
        assert!((low - 3.0).abs() < 1e-9);

        let high = attainable_tflops(&t4(), 1000.0).unwrap();
        assert_eq!(high, 65.0);
    }
}
