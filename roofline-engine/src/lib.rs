//! Analytical roofline model for LLM inference.
//!
//! Given a GPU datasheet and a model description, this crate decides whether
//! inference is compute- or memory-bound and derives latency, throughput and
//! memory-fit numbers from closed-form formulas. Every function is pure: the
//! same inputs always give the same output, and invalid inputs are rejected
//! rather than turned into `NaN` or infinity.
//!
//! ```
//! use roofline_engine::{evaluate_performance, GpuSpec, ModelSpec, Quantization};
//!
//! let t4 = GpuSpec::new("T4", 65.0, 300.0, 16.0);
//! let llama = ModelSpec::new(7.0, Quantization::Fp16);
//! let result = evaluate_performance(&t4, &llama, None).unwrap();
//! assert!(result.memory.model_size_gb > 13.0);
//! ```

pub mod aggregate;
pub mod dimension;
pub mod error;
pub mod intensity;
pub mod memory;
pub mod quantization;
pub mod roofline;
pub mod specs;
pub mod timing;

pub use aggregate::{evaluate_performance, evaluate_performance_with, CalculationResult};
pub use dimension::{estimate_hidden_dimension, ArchitectureDetail};
pub use error::{Result, RooflineError};
pub use intensity::{compute_arithmetic_intensity, IntensityVariant};
pub use memory::{analyze_memory_fit, estimate_model_size_bytes, MemoryFitResult, MemoryWarning};
pub use quantization::{lookup_quantization, Quantization, QuantizationInfo};
pub use roofline::{attainable_tflops, classify_bottleneck, compute_ops_to_byte_ratio, Bottleneck};
pub use specs::{GpuSpec, ModelSpec, SystemOverhead};
pub use timing::{
    compute_prefill_time_ms, compute_throughput_tok_per_sec, compute_time_per_token_ms,
    compute_timings, compute_total_generation_time_ms, PhaseTimings,
};
