//! Arithmetic intensity of the inference workload (FLOPs per byte moved).
//!
//! Several formulas have been used to approximate this number. They are kept
//! side by side as [`IntensityVariant`] so callers can choose which one to
//! standardise on; [`IntensityVariant::AttentionBreakdown`] is the default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::specs::ModelSpec;

/// Reported intensity never drops below this value
pub const MIN_INTENSITY: f64 = 0.1;

/// Attention intensity of Llama-2-7B at N=4096 with 128-wide heads
pub const FIXED_ATTENTION_INTENSITY: f64 = 62.0;

const HYBRID_CLAMP: (f64, f64) = (1.0, 1024.0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityVariant {
    /// Constant attention intensity, scaled by batch
    FixedConstant,
    /// `(4N²d + 3N²) / (8N² + 8Nd)` over the hidden dimension, scaled by batch
    #[default]
    AttentionBreakdown,
    /// Two FLOPs per weight byte loaded, reused across the batch
    WeightReuse,
    /// Attention cost growing with `log2(1 + N)`
    LogScaledAttention,
    /// Mean of weight reuse and per-head attention, clamped
    ClampedHybrid,
}

impl IntensityVariant {
    pub const ALL: [Self; 5] = [
        Self::FixedConstant,
        Self::AttentionBreakdown,
        Self::WeightReuse,
        Self::LogScaledAttention,
        Self::ClampedHybrid,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::FixedConstant => "fixed-constant",
            Self::AttentionBreakdown => "attention-breakdown",
            Self::WeightReuse => "weight-reuse",
            Self::LogScaledAttention => "log-scaled-attention",
            Self::ClampedHybrid => "clamped-hybrid",
        }
    }

    /// Intensity of `model` under this formula, floored at [`MIN_INTENSITY`]
    pub fn compute(self, model: &ModelSpec) -> Result<f64> {
        model.validate()?;

        let batch = model.batch_size as f64;
        let bytes_per_parameter = model.quantization.bytes_per_parameter();
        let seq_len = model.sequence_length as f64;
        let head_dim = model.architecture.head_dimension as f64;

        let raw = match self {
            Self::FixedConstant => FIXED_ATTENTION_INTENSITY * batch,
            Self::AttentionBreakdown => {
                let hidden = model.architecture.hidden_dimension;
                attention_intensity(seq_len, hidden, bytes_per_parameter) * batch
            }
            Self::WeightReuse => weight_reuse_intensity(batch, bytes_per_parameter),
            Self::LogScaledAttention => {
                batch * head_dim * (1.0 + seq_len).log2() / (8.0 * bytes_per_parameter)
            }
            Self::ClampedHybrid => {
                let reuse = weight_reuse_intensity(batch, bytes_per_parameter);
                let attention = attention_intensity(seq_len, head_dim, bytes_per_parameter) * batch;
                (0.5 * (reuse + attention)).clamp(HYBRID_CLAMP.0, HYBRID_CLAMP.1)
            }
        };

        Ok(raw.max(MIN_INTENSITY))
    }
}

impl fmt::Display for IntensityVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Self-attention FLOPs over bytes moved for one sequence of length `n`
/// with width `d`. Memory traffic is counted in FP16 and rescaled to the
/// actual precision.
fn attention_intensity(n: f64, d: f64, bytes_per_parameter: f64) -> f64 {
    let n_squared = n * n;
    let memory_bytes = (8.0 * n_squared + 8.0 * n * d) * (bytes_per_parameter / 2.0);
    let flops = 4.0 * n_squared * d + 3.0 * n_squared;
    flops / memory_bytes
}

fn weight_reuse_intensity(batch: f64, bytes_per_parameter: f64) -> f64 {
    2.0 * batch / bytes_per_parameter
}

/// Intensity under the default formula
pub fn compute_arithmetic_intensity(model: &ModelSpec) -> Result<f64> {
    IntensityVariant::default().compute(model)
}
