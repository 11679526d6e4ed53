use clap::{Args, Parser, Subcommand, ValueEnum};
use roofline_engine::{IntensityVariant, SystemOverhead};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Estimate whether LLM inference on a GPU is compute-bound or memory-bound
///
/// Latency, throughput and memory fit are derived from closed-form roofline
/// formulas; nothing is measured on real hardware.
pub struct Cli {
    /// JSON file holding user-defined GPUs
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "LLM_ROOFLINE_GPU_FILE",
        default_value = "gpus.json"
    )]
    pub gpu_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate one model on one GPU
    Estimate {
        #[command(flatten)]
        gpu: GpuArgs,

        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        overhead: OverheadArgs,

        /// Arithmetic intensity formula
        #[arg(long, value_enum, default_value_t = VariantArg::AttentionBreakdown)]
        variant: VariantArg,

        /// Print the full result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Evaluate one model on every known GPU
    Compare {
        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        overhead: OverheadArgs,

        /// Sort the table by the specified metric
        #[arg(long, value_enum, default_value_t = SortMetric::Throughput)]
        sort: SortMetric,
    },

    /// Show the arithmetic intensity of every formula against one GPU
    Intensity {
        #[command(flatten)]
        gpu: GpuArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Manage the GPU catalog
    Gpus {
        #[command(subcommand)]
        command: GpuCommands,
    },

    /// Download and inspect Hugging Face model configs
    Presets {
        #[command(subcommand)]
        command: PresetCommands,
    },
}

#[derive(Args)]
pub struct GpuArgs {
    /// GPU name from the catalog (see `gpus list`)
    #[arg(long)]
    pub gpu: Option<String>,

    /// Peak compute throughput in TFLOP/s
    #[arg(long)]
    pub compute_tflops: Option<f64>,

    /// Memory bandwidth in GB/s
    #[arg(long)]
    pub memory_bandwidth: Option<f64>,

    /// Device memory in GB
    #[arg(long)]
    pub memory_size: Option<f64>,
}

#[derive(Args)]
pub struct ModelArgs {
    /// Number of parameters in billions
    #[arg(long, value_name = "BILLIONS")]
    pub params: Option<f64>,

    /// Hugging Face model id to read the architecture from
    #[arg(long, value_name = "MODEL_ID")]
    pub hub: Option<String>,

    /// Read the --hub config from a saved config.json / configs.json instead of the network
    #[arg(long, value_name = "FILE", requires = "hub")]
    pub configs: Option<PathBuf>,

    /// Context length (defaults to 4096, or the model's context with --hub)
    #[arg(long)]
    pub seq_len: Option<u64>,

    #[arg(long, default_value_t = 1)]
    pub batch: u64,

    #[arg(long, default_value_t = 350)]
    pub prompt_tokens: u64,

    #[arg(long, default_value_t = 150)]
    pub output_tokens: u64,

    /// FP32, FP16, INT8 or INT4 (anything else is treated as FP16)
    #[arg(long)]
    pub quantization: Option<String>,

    #[arg(long)]
    pub head_dim: Option<u64>,

    #[arg(long)]
    pub layers: Option<u64>,

    #[arg(long)]
    pub heads: Option<u64>,
}

#[derive(Args)]
pub struct OverheadArgs {
    /// Prefill efficiency relative to the roofline, in percent
    #[arg(long, default_value_t = SystemOverhead::DEFAULT_EFFICIENCY_PCT)]
    pub prefill_efficiency: f64,

    /// Decode efficiency relative to the roofline, in percent
    #[arg(long, default_value_t = SystemOverhead::DEFAULT_EFFICIENCY_PCT)]
    pub decode_efficiency: f64,

    /// Report purely theoretical timings
    #[arg(long)]
    pub no_overhead: bool,
}

impl OverheadArgs {
    pub fn to_overhead(&self) -> Option<SystemOverhead> {
        if self.no_overhead {
            None
        } else {
            Some(SystemOverhead::new(self.prefill_efficiency, self.decode_efficiency))
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    FixedConstant,
    AttentionBreakdown,
    WeightReuse,
    LogScaledAttention,
    ClampedHybrid,
}

impl From<VariantArg> for IntensityVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::FixedConstant => Self::FixedConstant,
            VariantArg::AttentionBreakdown => Self::AttentionBreakdown,
            VariantArg::WeightReuse => Self::WeightReuse,
            VariantArg::LogScaledAttention => Self::LogScaledAttention,
            VariantArg::ClampedHybrid => Self::ClampedHybrid,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum SortMetric {
    Throughput,
    TimePerToken,
    Prefill,
    Utilization,
    Name,
}

#[derive(Subcommand)]
pub enum GpuCommands {
    /// List built-in and user-defined GPUs
    List,

    /// Add or replace a user-defined GPU
    Add {
        /// Name of the GPU
        name: String,

        /// Peak compute throughput in TFLOP/s
        #[arg(long, required_unless_present = "ai_performance", conflicts_with = "ai_performance")]
        compute_tflops: Option<f64>,

        /// Datasheet compute figure, e.g. "275 TOPS" or "512 GFLOPS"
        #[arg(long)]
        ai_performance: Option<String>,

        /// Memory bandwidth in GB/s
        #[arg(long)]
        memory_bandwidth: f64,

        /// Device memory in GB
        #[arg(long)]
        memory_size: f64,
    },

    /// Delete a user-defined GPU
    Del {
        /// Name of the GPU
        name: String,
    },

    /// Normalize a datasheet compute figure
    Normalize {
        /// e.g. "275 TOPS", "1.33 TFLOPS", "472 GFLOPS"
        ai_performance: String,
    },
}

#[derive(Subcommand)]
pub enum PresetCommands {
    /// Download config.json for each model into one configs.json map
    Fetch {
        /// Hugging Face model ids, e.g. meta-llama/Llama-2-7b-hf
        #[arg(required = true, value_name = "MODEL_ID")]
        model_ids: Vec<String>,

        /// File to write the {model_id: config} map to
        #[arg(long, value_name = "FILE", default_value = "configs.json")]
        out: PathBuf,
    },

    /// Show the sizing facts derived from a model's config
    Show {
        #[arg(value_name = "MODEL_ID")]
        model_id: String,

        /// Read from a saved config.json / configs.json instead of the network
        #[arg(long, value_name = "FILE")]
        configs: Option<PathBuf>,
    },
}
