pub mod config;
pub mod hub;
pub mod local;

use roofline_engine::{ArchitectureDetail, ModelSpec, Quantization};
use serde::Serialize;
use thiserror::Error;

pub use config::{estimate_parameters, infer_quantization, HfConfig};
pub use hub::HubClient;
pub use local::LocalConfigs;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("request for {model_id} failed: {source}")]
    Request {
        model_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching config for {model_id} returned HTTP {status}")]
    Status { model_id: String, status: u16 },

    #[error("config for {model_id} is not valid JSON: {source}")]
    Malformed {
        model_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("config for {model_id} is missing required field `{field}`")]
    MissingField { model_id: String, field: &'static str },

    #[error("no config for {model_id} in {location}")]
    UnknownModel { model_id: String, location: String },

    #[error("cannot read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HubError>;

/// Sizing facts extracted from a model repository
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPreset {
    pub model_id: String,
    pub parameters_b: f64,
    pub context_length: u64,
    pub head_dimension: u64,
    pub n_layers: u64,
    pub n_heads: u64,
    pub hidden_size: u64,
    pub quantization: Quantization,
}

impl ModelPreset {
    pub fn from_config(model_id: &str, config: &HfConfig) -> Result<Self> {
        let shape = config.core_shape(model_id)?;

        Ok(Self {
            model_id: model_id.to_string(),
            parameters_b: estimate_parameters(model_id, config)?,
            context_length: config.context_length(),
            head_dimension: config.head_dimension(shape),
            n_layers: shape.n_layers,
            n_heads: shape.n_heads,
            hidden_size: shape.hidden_size,
            quantization: infer_quantization(config),
        })
    }

    pub fn architecture(&self) -> ArchitectureDetail {
        ArchitectureDetail {
            head_dimension: self.head_dimension,
            n_layers: self.n_layers,
            n_heads: self.n_heads,
            hidden_dimension: self.hidden_size as f64,
        }
    }

    /// Engine input for a request against this model at its full context
    pub fn to_model_spec(
        &self,
        batch_size: u64,
        prompt_tokens: u64,
        output_tokens: u64,
    ) -> ModelSpec {
        ModelSpec::new(self.parameters_b, self.quantization)
            .with_sequence_length(self.context_length)
            .with_batch_size(batch_size)
            .with_tokens(prompt_tokens, output_tokens)
            .with_architecture(self.architecture())
    }
}

/// Anything that can produce a [`ModelPreset`] for a model id
pub trait PresetSource {
    fn load(&self, model_id: &str) -> Result<ModelPreset>;
}
