use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric precision of the model weights.
///
/// Parsing is total: any name that is not recognised resolves to
/// [`Quantization::Fp16`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Quantization {
    Fp32,
    #[default]
    Fp16,
    Int8,
    Int4,
}

/// Static properties of a quantization scheme
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantizationInfo {
    pub name: &'static str,
    pub bytes_per_parameter: f64,
    /// Compute throughput relative to the FP16 baseline
    pub compute_multiplier: f64,
    pub description: &'static str,
}

/// Canonical ordering: FP32, FP16, INT8, INT4.
pub const QUANTIZATION_TABLE: [QuantizationInfo; 4] = [
    QuantizationInfo {
        name: "FP32",
        bytes_per_parameter: 4.0,
        compute_multiplier: 0.5,
        description: "32-bit floating point, full precision",
    },
    QuantizationInfo {
        name: "FP16",
        bytes_per_parameter: 2.0,
        compute_multiplier: 1.0,
        description: "16-bit floating point, half precision baseline",
    },
    QuantizationInfo {
        name: "INT8",
        bytes_per_parameter: 1.0,
        compute_multiplier: 2.0,
        description: "8-bit integer weights",
    },
    QuantizationInfo {
        name: "INT4",
        bytes_per_parameter: 0.5,
        compute_multiplier: 4.0,
        description: "4-bit integer weights",
    },
];

const FALLBACK_INDEX: usize = 1;

impl Quantization {
    pub const ALL: [Self; 4] = [Self::Fp32, Self::Fp16, Self::Int8, Self::Int4];

    /// Resolve a scheme name, falling back to FP16 for anything unknown
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "FP32" => Self::Fp32,
            "FP16" | "BF16" => Self::Fp16,
            "INT8" => Self::Int8,
            "INT4" => Self::Int4,
            _ => Self::ALL[FALLBACK_INDEX],
        }
    }

    pub fn info(self) -> &'static QuantizationInfo {
        let index = match self {
            Self::Fp32 => 0,
            Self::Fp16 => 1,
            Self::Int8 => 2,
            Self::Int4 => 3,
        };
        &QUANTIZATION_TABLE[index]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn bytes_per_parameter(self) -> f64 {
        self.info().bytes_per_parameter
    }

    pub fn compute_multiplier(self) -> f64 {
        self.info().compute_multiplier
    }
}

impl From<&str> for Quantization {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for Quantization {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Quantization> for String {
    fn from(quantization: Quantization) -> Self {
        quantization.name().to_string()
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a quantization row by name. Never fails.
pub fn lookup_quantization(name: &str) -> &'static QuantizationInfo {
    Quantization::from_name(name).info()
}
