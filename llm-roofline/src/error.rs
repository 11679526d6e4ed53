use std::path::PathBuf;

use hf_model_presets::HubError;
use roofline_engine::RooflineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] RooflineError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("GPU '{0}' not found. Use `gpus list` to see available GPUs.")]
    UnknownGpu(String),

    #[error(
        "no GPU given: pass --gpu NAME or --compute-tflops, --memory-bandwidth and --memory-size"
    )]
    MissingGpu,

    #[error("no model given: pass --params or --hub MODEL_ID")]
    MissingModel,

    #[error("cannot parse compute figure '{0}': expected '<number> TOPS|TFLOPS|GFLOPS'")]
    UnknownPerformanceUnit(String),

    #[error("GPU file '{}': {source}", path.display())]
    GpuFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("GPU file '{}' is invalid: {source}", path.display())]
    GpuFileFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize result: {0}")]
    Json(#[from] serde_json::Error),
}
