use proptest::prelude::*;
use roofline_engine::{
    evaluate_performance, evaluate_performance_with, GpuSpec, IntensityVariant, ModelSpec,
    Quantization, SystemOverhead,
};

fn arb_quantization() -> impl Strategy<Value = Quantization> {
    prop::sample::select(Quantization::ALL.to_vec())
}

fn arb_variant() -> impl Strategy<Value = IntensityVariant> {
    prop::sample::select(IntensityVariant::ALL.to_vec())
}

fn arb_gpu() -> impl Strategy<Value = GpuSpec> {
    (1.0f64..2000.0, 50.0f64..8000.0, 4.0f64..192.0)
        .prop_map(|(compute, bandwidth, memory)| GpuSpec::new("gpu", compute, bandwidth, memory))
}

fn arb_model() -> impl Strategy<Value = ModelSpec> {
    (
        0.1f64..400.0,
        1u64..131_072,
        1u64..256,
        1u64..8192,
        0u64..4096,
        arb_quantization(),
    )
        .prop_map(|(params, seq_len, batch, prompt, output, quantization)| {
            ModelSpec::new(params, quantization)
                .with_sequence_length(seq_len)
                .with_batch_size(batch)
                .with_tokens(prompt, output)
        })
}

fn arb_overhead() -> impl Strategy<Value = Option<SystemOverhead>> {
    prop::option::of((1.0f64..=100.0, 1.0f64..=100.0).prop_map(|(p, d)| SystemOverhead::new(p, d)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn evaluation_is_deterministic(
        gpu in arb_gpu(),
        model in arb_model(),
        overhead in arb_overhead(),
        variant in arb_variant(),
    ) {
        let first = evaluate_performance_with(&gpu, &model, overhead.as_ref(), variant).unwrap();
        let second = evaluate_performance_with(&gpu, &model, overhead.as_ref(), variant).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn bottleneck_is_exclusive_and_consistent(
        gpu in arb_gpu(),
        model in arb_model(),
        variant in arb_variant(),
    ) {
        let result = evaluate_performance_with(&gpu, &model, None, variant).unwrap();
        prop_assert!(result.is_memory_bound() ^ result.is_compute_bound());
        prop_assert_eq!(
            result.is_compute_bound(),
            result.arithmetic_intensity >= result.ops_to_byte_ratio
        );
        prop_assert!(result.arithmetic_intensity >= 0.1);
    }

    #[test]
    fn more_bandwidth_never_slows_decode(
        gpu in arb_gpu(),
        model in arb_model(),
        extra in 0.0f64..4000.0,
    ) {
        let faster = GpuSpec {
            memory_bandwidth_gbs: gpu.memory_bandwidth_gbs + extra,
            ..gpu.clone()
        };
        let base = evaluate_performance(&gpu, &model, None).unwrap();
        let improved = evaluate_performance(&faster, &model, None).unwrap();
        prop_assert!(improved.timings.time_per_token_ms <= base.timings.time_per_token_ms);
    }

    #[test]
    fn more_compute_never_slows_prefill(
        gpu in arb_gpu(),
        model in arb_model(),
        extra in 0.0f64..2000.0,
    ) {
        let faster = GpuSpec { compute_tflops: gpu.compute_tflops + extra, ..gpu.clone() };
        let base = evaluate_performance(&gpu, &model, None).unwrap();
        let improved = evaluate_performance(&faster, &model, None).unwrap();
        prop_assert!(improved.timings.prefill_time_ms <= base.timings.prefill_time_ms);
    }

    #[test]
    fn results_are_finite(gpu in arb_gpu(), model in arb_model(), overhead in arb_overhead()) {
        let result = evaluate_performance(&gpu, &model, overhead.as_ref()).unwrap();
        prop_assert!(result.timings.total_generation_time_ms.is_finite());
        prop_assert!(result.timings.throughput_tok_per_sec.is_finite());
        prop_assert!(result.memory.memory_utilization_pct <= 999.0);
        prop_assert!(result.memory.free_memory_for_kv_gb >= 0.0);
    }
}
