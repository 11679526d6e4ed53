//! Device memory fit: weights, KV cache, utilization and warnings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::specs::{GpuSpec, ModelSpec};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Runtime context and activations on top of the raw weights
pub const RUNTIME_OVERHEAD_MULTIPLIER: f64 = 1.2;

/// Utilization figures above this are reported as this
pub const MAX_DISPLAYED_UTILIZATION_PCT: f64 = 999.0;

pub const HIGH_USAGE_THRESHOLD_PCT: f64 = 90.0;
pub const MODERATE_USAGE_THRESHOLD_PCT: f64 = 80.0;

/// Keys and values, stored in FP16
const KV_TENSORS: f64 = 2.0;
const KV_BYTES_PER_ELEMENT: f64 = 2.0;

/// Memory pressure classification, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "kebab-case")]
pub enum MemoryWarning {
    Exceeded {
        required_gb: f64,
        available_gb: f64,
        shortfall_gb: f64,
    },
    High { utilization_pct: f64 },
    Moderate { utilization_pct: f64 },
}

impl fmt::Display for MemoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exceeded {
                required_gb,
                available_gb,
                shortfall_gb,
            } => write!(
                f,
                "Model does not fit in GPU memory: requires {required_gb:.2} GB but only \
                 {available_gb:.2} GB is available (short by {shortfall_gb:.2} GB). \
                 Consider a smaller model, a more aggressive quantization, \
                 or a GPU with more memory."
            ),
            Self::High { utilization_pct } => write!(
                f,
                "High memory usage ({utilization_pct:.1}%). Consider reducing the batch size \
                 or sequence length."
            ),
            Self::Moderate { utilization_pct } => {
                write!(f, "Moderate memory usage ({utilization_pct:.1}%).")
            }
        }
    }
}

/// Memory footprint of a model on a GPU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFitResult {
    /// Raw weights
    pub model_size_gb: f64,
    /// Weights with the runtime overhead multiplier applied
    pub model_with_overhead_gb: f64,
    pub kv_cache_gb: f64,
    pub total_memory_needed_gb: f64,
    /// Capped at [`MAX_DISPLAYED_UTILIZATION_PCT`]
    pub memory_utilization_pct: f64,
    pub warning: Option<MemoryWarning>,
    pub free_memory_for_kv_gb: f64,
    pub kv_cache_bytes_per_token: f64,
    pub max_kv_tokens: u64,
    pub max_batch_size: u64,
}

impl MemoryFitResult {
    pub const fn has_memory_warning(&self) -> bool {
        self.warning.is_some()
    }

    pub fn memory_warning_message(&self) -> Option<String> {
        self.warning.as_ref().map(ToString::to_string)
    }

    pub fn fits(&self) -> bool {
        !matches!(self.warning, Some(MemoryWarning::Exceeded { .. }))
    }
}

/// Bytes occupied by the weights at the model's precision
pub fn estimate_model_size_bytes(model: &ModelSpec) -> f64 {
    model.parameters_b * 1e9 * model.quantization.bytes_per_parameter()
}

/// Coarse KV estimate used for utilization: it scales with parameter count
/// instead of the real layer/width shape.
pub fn estimate_kv_cache_gb(model: &ModelSpec) -> f64 {
    model.sequence_length as f64
        * model.batch_size as f64
        * model.parameters_b
        * KV_TENSORS
        * KV_BYTES_PER_ELEMENT
        / BYTES_PER_GB
}

/// Per-token, per-sequence KV footprint from the architecture shape
pub fn kv_cache_bytes_per_token(model: &ModelSpec) -> f64 {
    KV_TENSORS
        * model.architecture.n_layers as f64
        * model.architecture.hidden_dimension
        * KV_BYTES_PER_ELEMENT
}

/// Warning for a given total against capacity.
///
/// Rules are checked in order and the first match wins; both percentage
/// thresholds are exclusive.
pub fn memory_warning(total_memory_needed_gb: f64, memory_size_gb: f64) -> Option<MemoryWarning> {
    let utilization_pct = total_memory_needed_gb * 100.0 / memory_size_gb;

    if total_memory_needed_gb > memory_size_gb {
        Some(MemoryWarning::Exceeded {
            required_gb: total_memory_needed_gb,
            available_gb: memory_size_gb,
            shortfall_gb: total_memory_needed_gb - memory_size_gb,
        })
    } else if utilization_pct > HIGH_USAGE_THRESHOLD_PCT {
        Some(MemoryWarning::High { utilization_pct })
    } else if utilization_pct > MODERATE_USAGE_THRESHOLD_PCT {
        Some(MemoryWarning::Moderate { utilization_pct })
    } else {
        None
    }
}

pub fn analyze_memory_fit(gpu: &GpuSpec, model: &ModelSpec) -> Result<MemoryFitResult> {
    gpu.validate()?;
    model.validate()?;

    let model_size_gb = estimate_model_size_bytes(model) / BYTES_PER_GB;
    let model_with_overhead_gb = model_size_gb * RUNTIME_OVERHEAD_MULTIPLIER;
    let kv_cache_gb = estimate_kv_cache_gb(model);
    let total_memory_needed_gb = model_with_overhead_gb + kv_cache_gb;

    let utilization_pct = total_memory_needed_gb * 100.0 / gpu.memory_size_gb;

    let free_memory_for_kv_gb = (gpu.memory_size_gb - model_with_overhead_gb).max(0.0);
    let bytes_per_token = kv_cache_bytes_per_token(model);
    let max_kv_tokens = (free_memory_for_kv_gb * BYTES_PER_GB / bytes_per_token).floor() as u64;
    let max_batch_size = max_kv_tokens / model.sequence_length;

    Ok(MemoryFitResult {
        model_size_gb,
        model_with_overhead_gb,
        kv_cache_gb,
        total_memory_needed_gb,
        memory_utilization_pct: utilization_pct.min(MAX_DISPLAYED_UTILIZATION_PCT),
        warning: memory_warning(total_memory_needed_gb, gpu.memory_size_gb),
        free_memory_for_kv_gb,
        kv_cache_bytes_per_token: bytes_per_token,
        max_kv_tokens,
        max_batch_size,
    })
}
