use roofline_engine::{
    analyze_memory_fit, compute_ops_to_byte_ratio, compute_throughput_tok_per_sec,
    evaluate_performance, lookup_quantization, memory::memory_warning, ArchitectureDetail, GpuSpec,
    MemoryWarning, ModelSpec, Quantization, SystemOverhead,
};

fn t4() -> GpuSpec {
    GpuSpec::new("T4", 65.0, 300.0, 16.0)
}

fn llama_2_7b(quantization: Quantization) -> ModelSpec {
    ModelSpec::new(7.0, quantization)
        .with_sequence_length(4096)
        .with_batch_size(1)
        .with_tokens(350, 150)
}

#[test]
fn t4_llama_2_7b_fp16() {
    let result = evaluate_performance(&t4(), &llama_2_7b(Quantization::Fp16), None).unwrap();

    assert!((result.memory.model_size_gb - 13.04).abs() < 0.01);
    assert!((result.ops_to_byte_ratio - 216.7).abs() < 0.1);
    assert!((result.timings.time_per_token_ms - 46.7).abs() < 0.1);

    let expected_total =
        result.timings.prefill_time_ms + result.timings.time_per_token_ms * 150.0;
    assert_eq!(result.timings.total_generation_time_ms, expected_total);
    assert!(result.memory.has_memory_warning());
    assert!(result.memory.fits());
}

#[test]
fn zero_output_tokens_total_equals_prefill() {
    let model = llama_2_7b(Quantization::Fp16).with_tokens(350, 0);
    let result = evaluate_performance(&t4(), &model, Some(&SystemOverhead::default())).unwrap();
    assert_eq!(
        result.timings.total_generation_time_ms,
        result.timings.prefill_time_ms
    );
}

#[test]
fn int4_quarters_the_footprint() {
    let fp16 = analyze_memory_fit(&t4(), &llama_2_7b(Quantization::Fp16)).unwrap();
    let int4 = analyze_memory_fit(&t4(), &llama_2_7b(Quantization::Int4)).unwrap();
    assert_eq!(int4.model_size_gb, fp16.model_size_gb / 4.0);
}

#[test]
fn unknown_quantization_is_fp16() {
    assert_eq!(lookup_quantization("bogus"), lookup_quantization("FP16"));
    assert_eq!(Quantization::from("not-a-scheme"), Quantization::Fp16);
}

#[test]
fn throughput_guard() {
    assert_eq!(compute_throughput_tok_per_sec(0.0, 12_345), 0.0);
}

#[test]
fn warning_at_95_percent_is_high_usage() {
    let warning = memory_warning(9.5, 10.0).unwrap();
    assert!(matches!(warning, MemoryWarning::High { .. }));
    assert!(warning.to_string().contains("High memory usage"));
}

#[test]
fn no_warning_at_exactly_80_percent() {
    assert_eq!(memory_warning(8.0, 10.0), None);
}

#[test]
fn seventy_b_does_not_fit_on_t4() {
    let model = ModelSpec::new(70.0, Quantization::Fp16);
    let result = evaluate_performance(&t4(), &model, None).unwrap();
    let message = result.memory.memory_warning_message().unwrap();
    assert!(message.contains("does not fit"));
    assert!(!result.memory.fits());
    assert_eq!(result.memory.max_batch_size, 0);
}

#[test]
fn invalid_gpu_is_an_error() {
    let gpu = GpuSpec::new("zero", 0.0, 300.0, 16.0);
    assert!(compute_ops_to_byte_ratio(&gpu).is_err());
    assert!(evaluate_performance(&gpu, &llama_2_7b(Quantization::Fp16), None).is_err());
}

#[test]
fn overflowing_token_total_is_an_error() {
    let model = llama_2_7b(Quantization::Fp16).with_tokens(u64::MAX, 1);
    assert!(evaluate_performance(&t4(), &model, None).is_err());
}

#[test]
fn extreme_shapes_stay_finite() {
    let architecture =
        ArchitectureDetail::resolve(7.0, Some(1 << 33), Some(u64::MAX), Some(1 << 33));
    let model = llama_2_7b(Quantization::Fp16)
        .with_tokens(u64::MAX, 0)
        .with_batch_size(u64::MAX)
        .with_sequence_length(u64::MAX)
        .with_architecture(architecture);

    let result = evaluate_performance(&t4(), &model, Some(&SystemOverhead::default())).unwrap();
    assert!(result.arithmetic_intensity.is_finite());
    assert!(result.timings.total_generation_time_ms.is_finite());
    assert!(result.timings.throughput_tok_per_sec.is_finite());
    assert!(result.memory.memory_utilization_pct <= 999.0);
    assert_eq!(result.memory.max_kv_tokens, 0);
}
