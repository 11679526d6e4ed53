mod commands;
mod error;
mod gpus;
mod report;
mod utils;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use hf_model_presets::{HubClient, LocalConfigs, ModelPreset, PresetSource};
use roofline_engine::{
    classify_bottleneck, compute_ops_to_byte_ratio, evaluate_performance,
    evaluate_performance_with, ArchitectureDetail, GpuSpec, IntensityVariant, ModelSpec,
    Quantization,
};

use commands::{Cli, Commands, GpuArgs, GpuCommands, ModelArgs, PresetCommands};
use error::CliError;
use gpus::{catalog, find_gpu, load_gpu_file, save_gpu_file, GpuEntry};
use utils::normalize_ai_performance;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Some(Commands::Estimate {
            gpu,
            model,
            overhead,
            variant,
            json,
        }) => {
            let gpu = resolve_gpu(&gpu, &cli.gpu_file)?;
            let model = resolve_model(&model)?;
            let overhead = overhead.to_overhead();
            let result =
                evaluate_performance_with(&gpu, &model, overhead.as_ref(), variant.into())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                report::print_estimate(&gpu, &model, &result);
            }
        }
        Some(Commands::Compare { model, overhead, sort }) => {
            let user = load_gpu_file(&cli.gpu_file)?;
            let model = resolve_model(&model)?;
            let overhead = overhead.to_overhead();

            let mut results = catalog(&user)
                .iter()
                .map(|gpu| evaluate_performance(gpu, &model, overhead.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;
            report::sort_results(&mut results, sort);
            report::print_comparison(&results);
        }
        Some(Commands::Intensity { gpu, model }) => {
            let gpu = resolve_gpu(&gpu, &cli.gpu_file)?;
            let model = resolve_model(&model)?;
            let ratio = compute_ops_to_byte_ratio(&gpu)?;

            let rows = IntensityVariant::ALL
                .iter()
                .map(|variant| {
                    let intensity = variant.compute(&model)?;
                    let compute_bound = classify_bottleneck(ratio, intensity).is_compute_bound();
                    Ok((*variant, intensity, compute_bound))
                })
                .collect::<Result<Vec<_>, CliError>>()?;
            report::print_intensity(ratio, &rows);
        }
        Some(Commands::Gpus { command }) => match command {
            GpuCommands::List => {
                let user = load_gpu_file(&cli.gpu_file)?;
                report::print_gpus(&catalog(&user));
            }
            GpuCommands::Add {
                name,
                compute_tflops,
                ai_performance,
                memory_bandwidth,
                memory_size,
            } => {
                let compute_tflops = match (compute_tflops, ai_performance) {
                    (Some(tflops), _) => tflops,
                    (None, Some(text)) => normalize_ai_performance(&text)?.tflops(),
                    (None, None) => return Err(CliError::MissingGpu),
                };
                let entry = GpuEntry {
                    compute_tflops,
                    memory_bandwidth_gbs: memory_bandwidth,
                    memory_size_gb: memory_size,
                };
                entry.to_spec(&name).validate()?;

                let mut user = load_gpu_file(&cli.gpu_file)?;
                user.gpus.insert(name.clone(), entry);
                save_gpu_file(&user, &cli.gpu_file)?;
                println!("GPU '{}' added successfully.", name);
            }
            GpuCommands::Del { name } => {
                let mut user = load_gpu_file(&cli.gpu_file)?;
                if user.gpus.remove(&name).is_some() {
                    save_gpu_file(&user, &cli.gpu_file)?;
                    println!("GPU '{}' deleted successfully.", name);
                } else {
                    eprintln!("GPU '{}' not found in the GPU file.", name);
                }
            }
            GpuCommands::Normalize { ai_performance } => {
                println!("{}", normalize_ai_performance(&ai_performance)?);
            }
        },
        Some(Commands::Presets { command }) => match command {
            PresetCommands::Fetch { model_ids, out } => {
                let configs = HubClient::from_env().fetch_configs(&model_ids)?;
                LocalConfigs::new(&out).save(&configs)?;
                println!("Saved {} configs to '{}'.", configs.len(), out.display());
            }
            PresetCommands::Show { model_id, configs } => {
                let preset = load_preset(&model_id, configs.as_deref())?;
                report::print_preset(&preset);
            }
        },
        None => {
            eprintln!("No command specified. Use --help to see available commands.");
        }
    }

    Ok(())
}

/// Catalog entry, explicit datasheet numbers, or a catalog entry with some
/// numbers overridden.
fn resolve_gpu(args: &GpuArgs, gpu_file: &Path) -> Result<GpuSpec, CliError> {
    let mut gpu = match &args.gpu {
        Some(name) => find_gpu(&load_gpu_file(gpu_file)?, name)?,
        None => match (args.compute_tflops, args.memory_bandwidth, args.memory_size) {
            (Some(compute), Some(bandwidth), Some(memory)) => {
                GpuSpec::new("custom", compute, bandwidth, memory)
            }
            _ => return Err(CliError::MissingGpu),
        },
    };

    if let Some(compute) = args.compute_tflops {
        gpu.compute_tflops = compute;
    }
    if let Some(bandwidth) = args.memory_bandwidth {
        gpu.memory_bandwidth_gbs = bandwidth;
    }
    if let Some(memory) = args.memory_size {
        gpu.memory_size_gb = memory;
    }
    log::debug!("Resolved GPU: {:?}", gpu);
    Ok(gpu)
}

/// Build the engine input, pulling the architecture from a Hub preset when
/// `--hub` is given. Explicit flags win over preset values.
fn resolve_model(args: &ModelArgs) -> Result<ModelSpec, CliError> {
    let quantization = args.quantization.as_deref().map(Quantization::from_name);

    let model = if let Some(model_id) = &args.hub {
        let preset = load_preset(model_id, args.configs.as_deref())?;

        let parameters_b = args.params.unwrap_or(preset.parameters_b);
        // the preset's hidden size only gives way to an explicit head shape
        let mut architecture = if args.head_dim.is_some() || args.heads.is_some() {
            ArchitectureDetail::resolve(
                parameters_b,
                Some(args.head_dim.unwrap_or(preset.head_dimension)),
                None,
                Some(args.heads.unwrap_or(preset.n_heads)),
            )
        } else {
            preset.architecture()
        };
        architecture.n_layers = args.layers.unwrap_or(preset.n_layers);

        let mut model = preset
            .to_model_spec(args.batch, args.prompt_tokens, args.output_tokens)
            .with_architecture(architecture);
        model.parameters_b = parameters_b;
        if let Some(quantization) = quantization {
            model.quantization = quantization;
        }
        if let Some(seq_len) = args.seq_len {
            model.sequence_length = seq_len;
        }
        model
    } else {
        let parameters_b = args.params.ok_or(CliError::MissingModel)?;
        let architecture =
            ArchitectureDetail::resolve(parameters_b, args.head_dim, args.layers, args.heads);

        ModelSpec::new(parameters_b, quantization.unwrap_or_default())
            .with_sequence_length(args.seq_len.unwrap_or(ModelSpec::DEFAULT_SEQUENCE_LENGTH))
            .with_batch_size(args.batch)
            .with_tokens(args.prompt_tokens, args.output_tokens)
            .with_architecture(architecture)
    };

    log::debug!("Resolved model: {:?}", model);
    Ok(model)
}

fn load_preset(model_id: &str, configs: Option<&Path>) -> Result<ModelPreset, CliError> {
    let preset = match configs {
        Some(path) => LocalConfigs::new(path).load(model_id)?,
        None => HubClient::from_env().load(model_id)?,
    };
    Ok(preset)
}
