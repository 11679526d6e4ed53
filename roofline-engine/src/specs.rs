use serde::{Deserialize, Serialize};

use crate::dimension::ArchitectureDetail;
use crate::error::{require_at_least_one, require_positive, Result, RooflineError};
use crate::quantization::Quantization;

/// Accelerator description as printed on a datasheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSpec {
    pub name: String,
    /// Peak compute throughput (TFLOP/s)
    pub compute_tflops: f64,
    /// Memory bandwidth (GB/s)
    pub memory_bandwidth_gbs: f64,
    /// Device memory (GB)
    pub memory_size_gb: f64,
}

impl GpuSpec {
    pub fn new(
        name: impl Into<String>,
        compute_tflops: f64,
        memory_bandwidth_gbs: f64,
        memory_size_gb: f64,
    ) -> Self {
        Self {
            name: name.into(),
            compute_tflops,
            memory_bandwidth_gbs,
            memory_size_gb,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("compute_tflops", self.compute_tflops)?;
        require_positive("memory_bandwidth_gbs", self.memory_bandwidth_gbs)?;
        require_positive("memory_size_gb", self.memory_size_gb)
    }

    pub(crate) fn compute_flops_per_sec(&self) -> f64 {
        self.compute_tflops * 1e12
    }

    pub(crate) fn memory_bytes_per_sec(&self) -> f64 {
        self.memory_bandwidth_gbs * 1e9
    }
}

/// Workload description: model size, precision and request shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Parameter count in billions
    pub parameters_b: f64,
    pub sequence_length: u64,
    pub batch_size: u64,
    pub prompt_tokens: u64,
    pub output_tokens: u64,
    pub quantization: Quantization,
    pub architecture: ArchitectureDetail,
}

impl ModelSpec {
    pub const DEFAULT_SEQUENCE_LENGTH: u64 = 4096;
    pub const DEFAULT_PROMPT_TOKENS: u64 = 350;
    pub const DEFAULT_OUTPUT_TOKENS: u64 = 150;

    /// Single-request workload with an architecture estimated from the size
    pub fn new(parameters_b: f64, quantization: Quantization) -> Self {
        Self {
            parameters_b,
            sequence_length: Self::DEFAULT_SEQUENCE_LENGTH,
            batch_size: 1,
            prompt_tokens: Self::DEFAULT_PROMPT_TOKENS,
            output_tokens: Self::DEFAULT_OUTPUT_TOKENS,
            quantization,
            architecture: ArchitectureDetail::estimated(parameters_b),
        }
    }

    #[must_use]
    pub const fn with_sequence_length(mut self, sequence_length: u64) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub const fn with_tokens(mut self, prompt_tokens: u64, output_tokens: u64) -> Self {
        self.prompt_tokens = prompt_tokens;
        self.output_tokens = output_tokens;
        self
    }

    #[must_use]
    pub const fn with_architecture(mut self, architecture: ArchitectureDetail) -> Self {
        self.architecture = architecture;
        self
    }

    /// `output_tokens` may be zero: a prefill-only request is valid.
    pub fn validate(&self) -> Result<()> {
        require_positive("parameters_b", self.parameters_b)?;
        require_at_least_one("sequence_length", self.sequence_length)?;
        require_at_least_one("batch_size", self.batch_size)?;
        require_at_least_one("prompt_tokens", self.prompt_tokens)?;
        if self.prompt_tokens.checked_add(self.output_tokens).is_none() {
            return Err(RooflineError::InvalidInput {
                field: "output_tokens",
                value: self.output_tokens as f64,
                reason: "prompt plus output tokens must fit in 64 bits",
            });
        }
        require_at_least_one("head_dimension", self.architecture.head_dimension)?;
        require_at_least_one("n_layers", self.architecture.n_layers)?;
        require_at_least_one("n_heads", self.architecture.n_heads)?;
        require_positive("hidden_dimension", self.architecture.hidden_dimension)
    }

    pub const fn total_tokens(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.output_tokens)
    }
}

/// Real-world efficiency of each inference phase relative to the roofline.
///
/// Phase times are divided by `pct / 100`, so 80% efficiency makes a phase
/// take 1.25x the theoretical time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemOverhead {
    pub prefill_efficiency_pct: f64,
    pub decode_efficiency_pct: f64,
}

impl SystemOverhead {
    pub const DEFAULT_EFFICIENCY_PCT: f64 = 80.0;

    /// No deviation from the theoretical bound
    pub const IDEAL: Self = Self {
        prefill_efficiency_pct: 100.0,
        decode_efficiency_pct: 100.0,
    };

    pub const fn new(prefill_efficiency_pct: f64, decode_efficiency_pct: f64) -> Self {
        Self {
            prefill_efficiency_pct,
            decode_efficiency_pct,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_efficiency("prefill_efficiency_pct", self.prefill_efficiency_pct)?;
        require_efficiency("decode_efficiency_pct", self.decode_efficiency_pct)
    }

    pub(crate) fn prefill_factor(&self) -> f64 {
        self.prefill_efficiency_pct / 100.0
    }

    pub(crate) fn decode_factor(&self) -> f64 {
        self.decode_efficiency_pct / 100.0
    }
}

impl Default for SystemOverhead {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EFFICIENCY_PCT, Self::DEFAULT_EFFICIENCY_PCT)
    }
}

fn require_efficiency(field: &'static str, pct: f64) -> Result<()> {
    require_positive(field, pct)?;
    if pct > 100.0 {
        return Err(RooflineError::InvalidInput {
            field,
            value: pct,
            reason: "efficiency cannot exceed 100%",
        });
    }
    Ok(())
}
