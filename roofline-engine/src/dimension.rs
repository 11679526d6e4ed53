//! Transformer shape estimation.
//!
//! Optional architecture fields are resolved here, once, so downstream
//! formulas always see concrete values.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HEAD_DIMENSION: u64 = 128;
pub const DEFAULT_LAYERS: u64 = 32;
pub const DEFAULT_HEADS: u64 = 32;

/// Hidden dimension breakpoints as (max parameters in billions, hidden size)
const HIDDEN_DIMENSION_STEPS: [(f64, u64); 6] = [
    (1.0, 2048),
    (3.0, 3072),
    (7.0, 4096),
    (13.0, 5120),
    (30.0, 6656),
    (65.0, 8192),
];

/// Estimate the hidden dimension of a dense transformer from its size.
///
/// Models above 65B scale as `8192 * sqrt(p / 65)`.
pub fn estimate_hidden_dimension(parameters_b: f64) -> f64 {
    HIDDEN_DIMENSION_STEPS
        .iter()
        .find(|(max_params, _)| parameters_b <= *max_params)
        .map_or_else(
            || 8192.0 * (parameters_b / 65.0).sqrt(),
            |(_, hidden)| *hidden as f64,
        )
}

/// Concrete transformer shape used by the intensity and KV-cache formulas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureDetail {
    pub head_dimension: u64,
    pub n_layers: u64,
    pub n_heads: u64,
    pub hidden_dimension: f64,
}

impl Default for ArchitectureDetail {
    fn default() -> Self {
        Self {
            head_dimension: DEFAULT_HEAD_DIMENSION,
            n_layers: DEFAULT_LAYERS,
            n_heads: DEFAULT_HEADS,
            hidden_dimension: (DEFAULT_HEAD_DIMENSION * DEFAULT_HEADS) as f64,
        }
    }
}

impl ArchitectureDetail {
    /// Fill in missing fields.
    ///
    /// The hidden dimension is `n_heads * head_dimension` only when both were
    /// given; otherwise it is estimated from the parameter count.
    pub fn resolve(
        parameters_b: f64,
        head_dimension: Option<u64>,
        n_layers: Option<u64>,
        n_heads: Option<u64>,
    ) -> Self {
        let hidden_dimension = match (head_dimension, n_heads) {
            (Some(head_dim), Some(heads)) if head_dim > 0 && heads > 0 => {
                head_dim as f64 * heads as f64
            }
            _ => estimate_hidden_dimension(parameters_b),
        };

        Self {
            head_dimension: head_dimension.unwrap_or(DEFAULT_HEAD_DIMENSION),
            n_layers: n_layers.unwrap_or(DEFAULT_LAYERS),
            n_heads: n_heads.unwrap_or(DEFAULT_HEADS),
            hidden_dimension,
        }
    }

    /// Shape for a model when nothing but its size is known
    pub fn estimated(parameters_b: f64) -> Self {
        Self::resolve(parameters_b, None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piecewise_hidden_dimension() {
        assert_eq!(estimate_hidden_dimension(0.5), 2048.0);
        assert_eq!(estimate_hidden_dimension(1.0), 2048.0);
        assert_eq!(estimate_hidden_dimension(2.7), 3072.0);
        assert_eq!(estimate_hidden_dimension(7.0), 4096.0);
        assert_eq!(estimate_hidden_dimension(13.0), 5120.0);
        assert_eq!(estimate_hidden_dimension(30.0), 6656.0);
        assert_eq!(estimate_hidden_dimension(65.0), 8192.0);
    }

    #[test]
    fn test_large_models_scale_with_sqrt() {
        assert_eq!(estimate_hidden_dimension(260.0), 16384.0);
        assert!(estimate_hidden_dimension(70.0) > 8192.0);
    }

    #[test]
    fn test_resolve_uses_defaults_and_estimate() {
        let arch = ArchitectureDetail::resolve(13.0, None, None, None);
        assert_eq!(arch.head_dimension, 128);
        assert_eq!(arch.n_layers, 32);
        assert_eq!(arch.n_heads, 32);
        assert_eq!(arch.hidden_dimension, 5120.0);
    }

    #[test]
    fn test_resolve_prefers_explicit_shape() {
        let arch = ArchitectureDetail::resolve(13.0, Some(128), Some(40), Some(40));
        assert_eq!(arch.hidden_dimension, 5120.0);
        assert_eq!(arch.n_layers, 40);

        // head count alone is not enough to derive the hidden size
        let partial = ArchitectureDetail::resolve(70.0, None, Some(80), Some(64));
        assert_eq!(partial.hidden_dimension, estimate_hidden_dimension(70.0));
    }

    #[test]
    fn test_resolve_huge_shape_does_not_overflow() {
        let arch = ArchitectureDetail::resolve(7.0, Some(1 << 33), None, Some(1 << 33));
        assert_eq!(arch.hidden_dimension, 2f64.powi(66));
        assert!(arch.hidden_dimension.is_finite());
    }
}
