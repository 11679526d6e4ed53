//! Capability-checked view of a Hugging Face `config.json`.
//!
//! Only the numeric fields needed for sizing are read; everything else in the
//! file is ignored. Field presence is checked here so the engine never sees a
//! half-filled preset.

use roofline_engine::Quantization;
use serde::Deserialize;

use crate::{HubError, Result};

const DEFAULT_VOCAB_SIZE: u64 = 32_000;
const DEFAULT_CONTEXT_LENGTH: u64 = 4096;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuantizationConfig {
    pub bits: Option<u32>,
    #[serde(default)]
    pub load_in_4bit: bool,
    #[serde(default)]
    pub load_in_8bit: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HfConfig {
    pub hidden_size: Option<u64>,
    pub num_hidden_layers: Option<u64>,
    pub num_attention_heads: Option<u64>,
    pub num_key_value_heads: Option<u64>,
    pub head_dim: Option<u64>,
    pub intermediate_size: Option<u64>,
    pub vocab_size: Option<u64>,
    pub max_position_embeddings: Option<u64>,
    #[serde(default)]
    pub tie_word_embeddings: bool,
    pub torch_dtype: Option<String>,
    pub quantization_config: Option<QuantizationConfig>,
}

/// Shape fields every estimate depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreShape {
    pub hidden_size: u64,
    pub n_layers: u64,
    pub n_heads: u64,
}

impl HfConfig {
    pub fn from_json(model_id: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| HubError::Malformed {
            model_id: model_id.to_string(),
            source,
        })
    }

    pub fn from_value(model_id: &str, document: serde_json::Value) -> Result<Self> {
        serde_json::from_value(document).map_err(|source| HubError::Malformed {
            model_id: model_id.to_string(),
            source,
        })
    }

    pub fn core_shape(&self, model_id: &str) -> Result<CoreShape> {
        let require = |field: &'static str, value: Option<u64>| match value {
            Some(v) if v > 0 => Ok(v),
            _ => Err(HubError::MissingField {
                model_id: model_id.to_string(),
                field,
            }),
        };

        Ok(CoreShape {
            hidden_size: require("hidden_size", self.hidden_size)?,
            n_layers: require("num_hidden_layers", self.num_hidden_layers)?,
            n_heads: require("num_attention_heads", self.num_attention_heads)?,
        })
    }

    pub fn head_dimension(&self, shape: CoreShape) -> u64 {
        self.head_dim
            .filter(|&dim| dim > 0)
            .unwrap_or(shape.hidden_size / shape.n_heads)
    }

    pub fn context_length(&self) -> u64 {
        self.max_position_embeddings
            .filter(|&len| len > 0)
            .unwrap_or(DEFAULT_CONTEXT_LENGTH)
    }
}

/// Dense parameter count in billions.
///
/// Sums token embeddings (plus an untied LM head), the four attention
/// projections with grouped-query K/V, and a gated three-matrix MLP per
/// layer. Norms and biases are ignored.
pub fn estimate_parameters(model_id: &str, config: &HfConfig) -> Result<f64> {
    let shape = config.core_shape(model_id)?;
    let hidden = shape.hidden_size as f64;
    let head_dim = config.head_dimension(shape) as f64;
    let kv_heads = config.num_key_value_heads.unwrap_or(shape.n_heads) as f64;
    let intermediate = config.intermediate_size.map_or(4.0 * hidden, |size| size as f64);
    let vocab = config.vocab_size.unwrap_or(DEFAULT_VOCAB_SIZE) as f64;

    let q_width = shape.n_heads as f64 * head_dim;
    let kv_width = kv_heads * head_dim;
    let attention = hidden * q_width * 2.0 + hidden * kv_width * 2.0;
    let mlp = 3.0 * hidden * intermediate;
    let per_layer = attention + mlp;

    let embedding_copies = if config.tie_word_embeddings { 1.0 } else { 2.0 };
    let embeddings = embedding_copies * vocab * hidden;

    Ok((embeddings + per_layer * shape.n_layers as f64) / 1e9)
}

pub fn infer_quantization(config: &HfConfig) -> Quantization {
    if let Some(quant) = &config.quantization_config {
        if quant.load_in_4bit || quant.bits == Some(4) {
            return Quantization::Int4;
        }
        if quant.load_in_8bit || quant.bits == Some(8) {
            return Quantization::Int8;
        }
    }

    match config.torch_dtype.as_deref() {
        Some("float32") => Quantization::Fp32,
        _ => Quantization::Fp16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::LLAMA_2_7B;

    #[test]
    fn test_llama_2_7b_parameter_estimate() {
        let config = HfConfig::from_json("meta-llama/Llama-2-7b-hf", LLAMA_2_7B).unwrap();
        let params = estimate_parameters("meta-llama/Llama-2-7b-hf", &config).unwrap();
        assert!((params - 6.74).abs() < 0.01, "got {params}");
    }

    #[test]
    fn test_grouped_query_attention_shrinks_kv() {
        let mut config = HfConfig::from_json("m", LLAMA_2_7B).unwrap();
        let dense = estimate_parameters("m", &config).unwrap();
        config.num_key_value_heads = Some(8);
        let grouped = estimate_parameters("m", &config).unwrap();
        assert!(grouped < dense);
    }

    #[test]
    fn test_missing_shape_field() {
        let config = HfConfig::from_json("m", r#"{"hidden_size": 2048}"#).unwrap();
        let err = estimate_parameters("m", &config).unwrap_err();
        assert!(matches!(err, HubError::MissingField { field: "num_hidden_layers", .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = HfConfig::from_json("m", "{not json").unwrap_err();
        assert!(matches!(err, HubError::Malformed { .. }));
        assert!(err.to_string().contains('m'));
    }

    #[test]
    fn test_quantization_inference() {
        let mut config = HfConfig::from_json("m", LLAMA_2_7B).unwrap();
        assert_eq!(infer_quantization(&config), Quantization::Fp16);

        config.torch_dtype = Some("float32".to_string());
        assert_eq!(infer_quantization(&config), Quantization::Fp32);

        config.quantization_config = Some(QuantizationConfig {
            bits: Some(4),
            ..QuantizationConfig::default()
        });
        assert_eq!(infer_quantization(&config), Quantization::Int4);

        config.quantization_config = Some(QuantizationConfig {
            load_in_8bit: true,
            ..QuantizationConfig::default()
        });
        assert_eq!(infer_quantization(&config), Quantization::Int8);
    }

    #[test]
    fn test_huge_hidden_size_without_intermediate() {
        let json = format!(
            r#"{{"hidden_size": {}, "num_hidden_layers": 2, "num_attention_heads": 1}}"#,
            u64::MAX
        );
        let config = HfConfig::from_json("m", &json).unwrap();
        let params = estimate_parameters("m", &config).unwrap();
        assert!(params.is_finite());
        assert!(params > 0.0);
    }

    #[test]
    fn test_head_dim_and_context_fallbacks() {
        let config = HfConfig::from_json(
            "m",
            r#"{"hidden_size": 2048, "num_hidden_layers": 24, "num_attention_heads": 16}"#,
        )
        .unwrap();
        let shape = config.core_shape("m").unwrap();
        assert_eq!(config.head_dimension(shape), 128);
        assert_eq!(config.context_length(), 4096);
    }
}
