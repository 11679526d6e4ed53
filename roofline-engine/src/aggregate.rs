use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::intensity::IntensityVariant;
use crate::memory::{analyze_memory_fit, MemoryFitResult};
use crate::quantization::Quantization;
use crate::roofline::{
    attainable_tflops, classify_bottleneck, compute_ops_to_byte_ratio, Bottleneck,
};
use crate::specs::{GpuSpec, ModelSpec, SystemOverhead};
use crate::timing::{compute_timings, PhaseTimings};

/// Everything derived for one GPU/model/overhead combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub gpu_name: String,
    pub quantization: Quantization,
    pub intensity_variant: IntensityVariant,
    pub overhead: Option<SystemOverhead>,
    pub ops_to_byte_ratio: f64,
    pub arithmetic_intensity: f64,
    pub bottleneck: Bottleneck,
    pub attainable_tflops: f64,
    pub timings: PhaseTimings,
    pub memory: MemoryFitResult,
}

impl CalculationResult {
    pub const fn is_memory_bound(&self) -> bool {
        self.bottleneck.is_memory_bound()
    }

    pub const fn is_compute_bound(&self) -> bool {
        self.bottleneck.is_compute_bound()
    }
}

/// Evaluate with the default intensity formula
pub fn evaluate_performance(
    gpu: &GpuSpec,
    model: &ModelSpec,
    overhead: Option<&SystemOverhead>,
) -> Result<CalculationResult> {
    evaluate_performance_with(gpu, model, overhead, IntensityVariant::default())
}

pub fn evaluate_performance_with(
    gpu: &GpuSpec,
    model: &ModelSpec,
    overhead: Option<&SystemOverhead>,
    variant: IntensityVariant,
) -> Result<CalculationResult> {
    gpu.validate()?;
    model.validate()?;
    if let Some(overhead) = overhead {
        overhead.validate()?;
    }

    let ops_to_byte_ratio = compute_ops_to_byte_ratio(gpu)?;
    let arithmetic_intensity = variant.compute(model)?;

    Ok(CalculationResult {
        gpu_name: gpu.name.clone(),
        quantization: model.quantization,
        intensity_variant: variant,
        overhead: overhead.copied(),
        ops_to_byte_ratio,
        arithmetic_intensity,
        bottleneck: classify_bottleneck(ops_to_byte_ratio, arithmetic_intensity),
        attainable_tflops: attainable_tflops(gpu, arithmetic_intensity)?,
        timings: compute_timings(gpu, model, overhead)?,
        memory: analyze_memory_fit(gpu, model)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RooflineError;

    fn t4() -> GpuSpec {
        GpuSpec::new("T4", 65.0, 300.0, 16.0)
    }

    #[test]
    fn test_t4_llama_is_compute_bound_for_attention() {
        let model = ModelSpec::new(7.0, Quantization::Fp16);
        let result = evaluate_performance(&t4(), &model, None).unwrap();

        assert_eq!(result.gpu_name, "T4");
        assert_eq!(result.intensity_variant, IntensityVariant::AttentionBreakdown);
        assert!(result.is_compute_bound());
        assert!(!result.is_memory_bound());
        assert_eq!(result.attainable_tflops, 65.0);
    }

    #[test]
    fn test_weight_reuse_variant_is_memory_bound() {
        let model = ModelSpec::new(7.0, Quantization::Fp16);
        let result =
            evaluate_performance_with(&t4(), &model, None, IntensityVariant::WeightReuse).unwrap();
        assert!(result.is_memory_bound());
        assert_eq!(result.arithmetic_intensity, 1.0);
    }

    #[test]
    fn test_rejects_bad_input_instead_of_infinity() {
        let gpu = GpuSpec::new("bad", 65.0, 300.0, 0.0);
        let err = evaluate_performance(&gpu, &ModelSpec::new(7.0, Quantization::Fp16), None)
            .unwrap_err();
        assert!(matches!(err, RooflineError::InvalidInput { field: "memory_size_gb", .. }));
    }

    #[test]
    fn test_overhead_is_recorded() {
        let model = ModelSpec::new(7.0, Quantization::Int8);
        let overhead = SystemOverhead::default();
        let result = evaluate_performance(&t4(), &model, Some(&overhead)).unwrap();
        assert_eq!(result.overhead, Some(overhead));
        assert!(result.timings.prefill_time_ms > result.timings.theoretical_prefill_time_ms);
    }

    #[test]
    fn test_result_serializes() {
        let model = ModelSpec::new(7.0, Quantization::Fp16);
        let result = evaluate_performance(&t4(), &model, None).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["quantization"], "FP16");
        assert_eq!(json["bottleneck"], "compute-bound");
        assert_eq!(json["memory"]["warning"]["level"], "high");

        let back: CalculationResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.bottleneck, result.bottleneck);
        assert_eq!(back.memory.max_batch_size, result.memory.max_batch_size);
    }
}
