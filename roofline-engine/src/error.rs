use thiserror::Error;

/// Errors produced while evaluating a hardware/model pair.
///
/// Unknown quantization names are deliberately absent: lookup falls back
/// to FP16 instead of failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RooflineError {
    /// An input field is outside its valid range
    #[error("invalid {field}: {value} ({reason})")]
    InvalidInput {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
        /// What the field must satisfy
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, RooflineError>;

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RooflineError::InvalidInput {
            field,
            value,
            reason: "must be a finite number greater than zero",
        })
    }
}

pub(crate) fn require_at_least_one(field: &'static str, value: u64) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(RooflineError::InvalidInput {
            field,
            value: value as f64,
            reason: "must be at least 1",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive_rejects_zero_nan_and_infinity() {
        assert!(require_positive("x", 0.0).is_err());
        assert!(require_positive("x", -1.0).is_err());
        assert!(require_positive("x", f64::NAN).is_err());
        assert!(require_positive("x", f64::INFINITY).is_err());
        assert!(require_positive("x", 1e-9).is_ok());
    }

    #[test]
    fn test_error_message_names_the_field() {
        let err = require_positive("memory_bandwidth_gbs", 0.0).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("memory_bandwidth_gbs"));
        assert!(message.contains("greater than zero"));
    }
}
