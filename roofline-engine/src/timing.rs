use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::estimate_model_size_bytes;
use crate::specs::{GpuSpec, ModelSpec, SystemOverhead};

/// FLOPs per parameter per token in a forward pass (multiply + accumulate)
const FLOPS_PER_PARAMETER: f64 = 2.0;

/// Latency and throughput of one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    /// Roofline prefill time before efficiency adjustment
    pub theoretical_prefill_time_ms: f64,
    /// Roofline decode step time before efficiency adjustment
    pub theoretical_time_per_token_ms: f64,
    pub prefill_time_ms: f64,
    pub time_per_token_ms: f64,
    pub total_generation_time_ms: f64,
    pub throughput_tok_per_sec: f64,
}

/// Prefill is compute-bound: every prompt token touches every parameter.
pub fn compute_prefill_time_ms(gpu: &GpuSpec, model: &ModelSpec) -> Result<f64> {
    gpu.validate()?;
    model.validate()?;

    let flops = model.prompt_tokens as f64 * model.parameters_b * 1e9 * FLOPS_PER_PARAMETER;
    let effective_flops_per_sec =
        gpu.compute_flops_per_sec() * model.quantization.compute_multiplier();
    Ok(flops / effective_flops_per_sec * 1000.0)
}

/// Decode is memory-bound: each step streams the full set of weights.
pub fn compute_time_per_token_ms(gpu: &GpuSpec, model: &ModelSpec) -> Result<f64> {
    gpu.validate()?;
    model.validate()?;

    Ok(estimate_model_size_bytes(model) / gpu.memory_bytes_per_sec() * 1000.0)
}

pub fn compute_total_generation_time_ms(
    prefill_time_ms: f64,
    time_per_token_ms: f64,
    output_tokens: u64,
) -> f64 {
    prefill_time_ms + time_per_token_ms * output_tokens as f64
}

/// Tokens per second over the whole request; zero when no time elapsed.
pub fn compute_throughput_tok_per_sec(total_time_ms: f64, total_tokens: u64) -> f64 {
    if total_time_ms <= 0.0 {
        return 0.0;
    }
    total_tokens as f64 / total_time_ms * 1000.0
}

/// All timings for a request, with phase times divided by the overhead
/// efficiency when one is given.
pub fn compute_timings(
    gpu: &GpuSpec,
    model: &ModelSpec,
    overhead: Option<&SystemOverhead>,
) -> Result<PhaseTimings> {
    let theoretical_prefill_time_ms = compute_prefill_time_ms(gpu, model)?;
    let theoretical_time_per_token_ms = compute_time_per_token_ms(gpu, model)?;

    let (prefill_time_ms, time_per_token_ms) = match overhead {
        Some(overhead) => {
            overhead.validate()?;
            (
                theoretical_prefill_time_ms / overhead.prefill_factor(),
                theoretical_time_per_token_ms / overhead.decode_factor(),
            )
        }
        None => (theoretical_prefill_time_ms, theoretical_time_per_token_ms),
    };

    let total_generation_time_ms =
        compute_total_generation_time_ms(prefill_time_ms, time_per_token_ms, model.output_tokens);

    Ok(PhaseTimings {
        theoretical_prefill_time_ms,
        theoretical_time_per_token_ms,
        prefill_time_ms,
        time_per_token_ms,
        total_generation_time_ms,
        throughput_tok_per_sec: compute_throughput_tok_per_sec(
            total_generation_time_ms,
            model.total_tokens(),
        ),
    })
}
