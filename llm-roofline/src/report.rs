use hf_model_presets::ModelPreset;
use prettytable::{row, Table};
use roofline_engine::{CalculationResult, GpuSpec, IntensityVariant, ModelSpec};

use crate::commands::SortMetric;
use crate::utils::{format_ms, format_thousands};

pub fn print_estimate(gpu: &GpuSpec, model: &ModelSpec, result: &CalculationResult) {
    let mut table = Table::new();
    table.add_row(row!["GPU", format!(
        "{} ({} TFLOP/s, {} GB/s, {} GB)",
        gpu.name, gpu.compute_tflops, gpu.memory_bandwidth_gbs, gpu.memory_size_gb
    )]);
    table.add_row(row!["Model", format!(
        "{}B parameters, {}",
        model.parameters_b,
        model.quantization.info().description
    )]);
    table.add_row(row!["Sequence Length", format_thousands(model.sequence_length)]);
    table.add_row(row!["Batch Size", model.batch_size]);
    table.add_row(row!["Prompt / Output Tokens", format!(
        "{} / {}",
        format_thousands(model.prompt_tokens),
        format_thousands(model.output_tokens)
    )]);
    if let Some(overhead) = &result.overhead {
        table.add_row(row!["Efficiency (prefill / decode)", format!(
            "{}% / {}%",
            overhead.prefill_efficiency_pct, overhead.decode_efficiency_pct
        )]);
    }

    table.add_row(row!["Ops:Byte Ratio", format!("{:.1}", result.ops_to_byte_ratio)]);
    table.add_row(row![
        "Arithmetic Intensity",
        format!("{:.1} ({})", result.arithmetic_intensity, result.intensity_variant)
    ]);
    table.add_row(row!["Bottleneck", result.bottleneck]);
    table.add_row(row!["Attainable Compute", format!("{:.2} TFLOP/s", result.attainable_tflops)]);

    let timings = &result.timings;
    table.add_row(row!["Prefill Time", format_ms(timings.prefill_time_ms)]);
    table.add_row(row!["Time per Token", format_ms(timings.time_per_token_ms)]);
    table.add_row(row!["Total Generation Time", format_ms(timings.total_generation_time_ms)]);
    table.add_row(row!["Throughput", format!("{:.1} tok/s", timings.throughput_tok_per_sec)]);

    let memory = &result.memory;
    table.add_row(row!["Model Size", format!("{:.2} GB", memory.model_size_gb)]);
    table.add_row(row!["Total Memory Needed", format!("{:.2} GB", memory.total_memory_needed_gb)]);
    table.add_row(row!["Memory Utilization", format!("{:.1}%", memory.memory_utilization_pct)]);
    table.add_row(row![
        "Free Memory for KV Cache",
        format!("{:.2} GB", memory.free_memory_for_kv_gb)
    ]);
    table.add_row(row!["Max KV Cache Tokens", format_thousands(memory.max_kv_tokens)]);
    table.add_row(row!["Max Batch Size", format_thousands(memory.max_batch_size)]);
    table.printstd();

    if let Some(message) = memory.memory_warning_message() {
        println!("Warning: {}", message);
    }
}

pub fn sort_results(results: &mut [CalculationResult], sort: SortMetric) {
    results.sort_by(|a, b| match sort {
        SortMetric::Throughput => b
            .timings
            .throughput_tok_per_sec
            .total_cmp(&a.timings.throughput_tok_per_sec),
        SortMetric::TimePerToken => a
            .timings
            .time_per_token_ms
            .total_cmp(&b.timings.time_per_token_ms),
        SortMetric::Prefill => a.timings.prefill_time_ms.total_cmp(&b.timings.prefill_time_ms),
        SortMetric::Utilization => a
            .memory
            .memory_utilization_pct
            .total_cmp(&b.memory.memory_utilization_pct),
        SortMetric::Name => a.gpu_name.cmp(&b.gpu_name),
    });
}

pub fn print_comparison(results: &[CalculationResult]) {
    let mut table = Table::new();
    table.add_row(row![
        "GPU",
        "Bottleneck",
        "Prefill",
        "Time per Token",
        "Throughput",
        "Memory",
        "Fits"
    ]);
    for result in results {
        table.add_row(row![
            result.gpu_name,
            result.bottleneck,
            format_ms(result.timings.prefill_time_ms),
            format_ms(result.timings.time_per_token_ms),
            format!("{:.1} tok/s", result.timings.throughput_tok_per_sec),
            format!("{:.1}%", result.memory.memory_utilization_pct),
            if result.memory.fits() { "yes" } else { "no" }
        ]);
    }
    table.printstd();
}

pub fn print_intensity(ops_to_byte_ratio: f64, rows: &[(IntensityVariant, f64, bool)]) {
    println!("Ops:Byte Ratio: {:.1}", ops_to_byte_ratio);
    let mut table = Table::new();
    table.add_row(row!["Formula", "Arithmetic Intensity", "Bottleneck"]);
    for (variant, intensity, compute_bound) in rows {
        let bottleneck = if *compute_bound { "compute-bound" } else { "memory-bound" };
        let marker = if *variant == IntensityVariant::default() { " (default)" } else { "" };
        table.add_row(row![
            format!("{}{}", variant, marker),
            format!("{:.2}", intensity),
            bottleneck
        ]);
    }
    table.printstd();
}

pub fn print_gpus(gpus: &[GpuSpec]) {
    let mut table = Table::new();
    table.add_row(row!["GPU", "Compute (TFLOP/s)", "Bandwidth (GB/s)", "Memory (GB)"]);
    for gpu in gpus {
        table.add_row(row![
            gpu.name,
            gpu.compute_tflops,
            gpu.memory_bandwidth_gbs,
            gpu.memory_size_gb
        ]);
    }
    table.printstd();
}

pub fn print_preset(preset: &ModelPreset) {
    let mut table = Table::new();
    table.add_row(row!["Model", preset.model_id]);
    table.add_row(row!["Parameters", format!("{:.2}B", preset.parameters_b)]);
    table.add_row(row!["Precision", preset.quantization.info().description]);
    table.add_row(row!["Context Length", format_thousands(preset.context_length)]);
    table.add_row(row!["Hidden Size", format_thousands(preset.hidden_size)]);
    table.add_row(row!["Layers", preset.n_layers]);
    table.add_row(row!["Attention Heads", preset.n_heads]);
    table.add_row(row!["Head Dimension", preset.head_dimension]);
    table.printstd();
}

#[cfg(test)]
mod tests {
    use super::*;
    use roofline_engine::{evaluate_performance, Quantization};

    fn results() -> Vec<CalculationResult> {
        let model = ModelSpec::new(7.0, Quantization::Fp16);
        crate::gpus::builtin_gpus()
            .iter()
            .map(|gpu| evaluate_performance(gpu, &model, None).unwrap())
            .collect()
    }

    #[test]
    fn test_sort_by_throughput_is_descending() {
        let mut results = results();
        sort_results(&mut results, SortMetric::Throughput);
        for pair in results.windows(2) {
            let (first, second) = (&pair[0].timings, &pair[1].timings);
            assert!(first.throughput_tok_per_sec >= second.throughput_tok_per_sec);
        }
    }

    #[test]
    fn test_sort_by_time_per_token_puts_fastest_memory_first() {
        let mut results = results();
        sort_results(&mut results, SortMetric::TimePerToken);
        assert_eq!(results[0].gpu_name, "H100-SXM");
    }

    #[test]
    fn test_sort_by_name() {
        let mut results = results();
        sort_results(&mut results, SortMetric::Name);
        assert_eq!(results[0].gpu_name, "A100-40GB");
    }
}
