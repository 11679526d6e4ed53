use std::fmt;

use fancy_regex::Regex;

use crate::error::CliError;

pub fn format_thousands(value: u64) -> String {
    let re = Regex::new(r"(?<=\d)(?=(\d{3})+$)").unwrap();
    re.replace_all(&value.to_string(), ",").to_string()
}

pub fn format_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{:.2} ms", ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceUnit {
    Tflops,
    Gflops,
    Fp4SparseTflops,
}

/// A datasheet compute figure with its unit normalized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiPerformance {
    pub value: f64,
    pub unit: PerformanceUnit,
}

impl AiPerformance {
    /// The headline figure in TFLOP/s, taken at face value.
    ///
    /// Only the magnitude is converted. TOPS and FP4-sparse figures stay
    /// peak numbers at their own precision and are not derated to dense FP16.
    pub fn tflops(&self) -> f64 {
        match self.unit {
            PerformanceUnit::Tflops | PerformanceUnit::Fp4SparseTflops => self.value,
            PerformanceUnit::Gflops => self.value / 1000.0,
        }
    }
}

impl fmt::Display for AiPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            PerformanceUnit::Tflops => "TFLOPS",
            PerformanceUnit::Gflops => "GFLOPS",
            PerformanceUnit::Fp4SparseTflops => "TFLOPS (FP4-Sparse)",
        };
        write!(f, "{} {}", self.value, unit)
    }
}

/// Parse figures such as "275 TOPS", "1.33 TFLOPS" or "472 GFLOPS".
///
/// Integer TOPS are treated as TFLOPS; unknown units are rejected.
pub fn normalize_ai_performance(text: &str) -> Result<AiPerformance, CliError> {
    let invalid = || CliError::UnknownPerformanceUnit(text.to_string());

    let (value, unit) = text.trim().split_once(char::is_whitespace).ok_or_else(invalid)?;
    let value: f64 = value.replace(',', "").parse().map_err(|_| invalid())?;

    let unit = match unit.trim() {
        "TOPS" | "TOPs" | "TFLOPS" => PerformanceUnit::Tflops,
        "GFLOPS" => PerformanceUnit::Gflops,
        "TFLOPS (FP4—Sparse)" | "TFLOPS (FP4-Sparse)" => PerformanceUnit::Fp4SparseTflops,
        _ => return Err(invalid()),
    };

    Ok(AiPerformance { value, unit })
}
