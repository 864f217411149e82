//! Kubernetes resource quantity parsing
//!
//! Converts quantity strings such as `"500m"`, `"1.5"`, `"512Mi"` or `"1e3"`
//! into a canonical base unit: fractional cores for CPU and bytes for memory.
//! Parsing happens exactly once, when raw cluster data is reduced into a
//! snapshot, so nothing downstream ever handles strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors produced while parsing a resource quantity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("invalid numeric part {0:?}")]
    InvalidNumber(String),

    #[error("unrecognized unit suffix {0:?}")]
    UnknownSuffix(String),

    #[error("quantity must not be negative")]
    Negative,

    #[error("quantity {0:?} is out of range")]
    OutOfRange(String),
}

/// A raw, unparsed resource quantity as reported by the cluster API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(pub String);

impl Quantity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the quantity as CPU, in fractional cores
    pub fn to_cores(&self) -> Result<f64, QuantityError> {
        parse_cpu_cores(&self.0)
    }

    /// Interpret the quantity as memory, in bytes
    pub fn to_bytes(&self) -> Result<f64, QuantityError> {
        parse_memory_bytes(&self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Quantity {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Parse a CPU quantity (e.g. "250m", "2", "0.5") into fractional cores
pub fn parse_cpu_cores(raw: &str) -> Result<f64, QuantityError> {
    parse_quantity(raw)
}

/// Parse a memory quantity (e.g. "128Mi", "1G", "1048576") into bytes
pub fn parse_memory_bytes(raw: &str) -> Result<f64, QuantityError> {
    parse_quantity(raw)
}

/// Parse any quantity into its base unit.
///
/// Accepts an optionally signed decimal number followed by one of the
/// Kubernetes suffixes: binary (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`), decimal
/// (`n`, `u`, `m`, `k`, `M`, `G`, `T`, `P`, `E`) or a decimal exponent
/// (`e3`, `E-2`).
pub fn parse_quantity(raw: &str) -> Result<f64, QuantityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::Empty);
    }

    let split = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '+' || *c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    if !number.chars().any(|c| c.is_ascii_digit()) {
        return Err(QuantityError::InvalidNumber(number.to_string()));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| QuantityError::InvalidNumber(number.to_string()))?;
    if !value.is_finite() {
        return Err(QuantityError::OutOfRange(trimmed.to_string()));
    }
    if value < 0.0 {
        return Err(QuantityError::Negative);
    }

    let scaled = apply_suffix(value, suffix)?;
    if !scaled.is_finite() {
        return Err(QuantityError::OutOfRange(trimmed.to_string()));
    }
    Ok(scaled)
}

fn apply_suffix(value: f64, suffix: &str) -> Result<f64, QuantityError> {
    const KI: f64 = 1024.0;

    // Sub-unit suffixes divide so that e.g. "500m" lands exactly on 0.5.
    let scaled = match suffix {
        "" => value,
        "n" => value / 1e9,
        "u" => value / 1e6,
        "m" => value / 1e3,
        "k" => value * 1e3,
        "M" => value * 1e6,
        "G" => value * 1e9,
        "T" => value * 1e12,
        "P" => value * 1e15,
        "E" => value * 1e18,
        "Ki" => value * KI,
        "Mi" => value * KI.powi(2),
        "Gi" => value * KI.powi(3),
        "Ti" => value * KI.powi(4),
        "Pi" => value * KI.powi(5),
        "Ei" => value * KI.powi(6),
        other => {
            let exponent = other
                .strip_prefix('e')
                .or_else(|| other.strip_prefix('E'))
                .and_then(|exp| exp.parse::<i32>().ok())
                .ok_or_else(|| QuantityError::UnknownSuffix(other.to_string()))?;
            value * 10f64.powi(exponent)
        }
    };

    Ok(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_parse_cpu_integer_cores() {
        assert_close(parse_cpu_cores("4").unwrap(), 4.0);
        assert_close(parse_cpu_cores("0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_cpu_fractional_and_milli() {
        assert_close(parse_cpu_cores("0.5").unwrap(), 0.5);
        assert_close(parse_cpu_cores("500m").unwrap(), 0.5);
        assert_close(parse_cpu_cores("1900m").unwrap(), 1.9);
        assert_close(parse_cpu_cores("2.5m").unwrap(), 0.0025);
        assert_close(parse_cpu_cores("250000u").unwrap(), 0.25);
        assert_close(parse_cpu_cores("500000000n").unwrap(), 0.5);
    }

    #[test]
    fn test_parse_memory_binary_suffixes() {
        assert_close(parse_memory_bytes("1Ki").unwrap(), 1024.0);
        assert_close(parse_memory_bytes("128Mi").unwrap(), 128.0 * 1024.0 * 1024.0);
        assert_close(parse_memory_bytes("2Gi").unwrap(), 2.0 * 1024.0 * 1024.0 * 1024.0);
        assert_close(parse_memory_bytes("16318996Ki").unwrap(), 16318996.0 * 1024.0);
        assert_close(parse_memory_bytes("0.5Gi").unwrap(), 512.0 * 1024.0 * 1024.0);
    }

    #[test]
    fn test_parse_memory_decimal_suffixes_and_plain_bytes() {
        assert_close(parse_memory_bytes("1048576").unwrap(), 1_048_576.0);
        assert_close(parse_memory_bytes("500M").unwrap(), 500_000_000.0);
        assert_close(parse_memory_bytes("1G").unwrap(), 1_000_000_000.0);
        assert_close(parse_memory_bytes("64k").unwrap(), 64_000.0);
    }

    #[test]
    fn test_parse_exponent_notation() {
        assert_close(parse_quantity("1e3").unwrap(), 1000.0);
        assert_close(parse_quantity("5E-1").unwrap(), 0.5);
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_close(parse_cpu_cores(" 250m ").unwrap(), 0.25);
    }

    #[test]
    fn test_parse_rejects_unknown_suffix() {
        assert_eq!(
            parse_memory_bytes("512MB"),
            Err(QuantityError::UnknownSuffix("MB".to_string()))
        );
        assert_eq!(
            parse_cpu_cores("2cores"),
            Err(QuantityError::UnknownSuffix("cores".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_numbers() {
        assert_eq!(parse_cpu_cores(""), Err(QuantityError::Empty));
        assert_eq!(parse_cpu_cores("   "), Err(QuantityError::Empty));
        assert!(matches!(
            parse_cpu_cores("m"),
            Err(QuantityError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_cpu_cores("1.2.3"),
            Err(QuantityError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_memory_bytes("abc"),
            Err(QuantityError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative_values() {
        assert_eq!(parse_cpu_cores("-100m"), Err(QuantityError::Negative));
    }

    #[test]
    fn test_parse_rejects_values_overflowing_f64() {
        assert_eq!(
            parse_quantity("1e400"),
            Err(QuantityError::OutOfRange("1e400".to_string()))
        );
        assert!(matches!(
            parse_memory_bytes(&"9".repeat(400)),
            Err(QuantityError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_memory_bytes(&format!("{}Ei", "9".repeat(300))),
            Err(QuantityError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_quantity_wrapper_conversions() {
        let cpu = Quantity::from("750m");
        assert_close(cpu.to_cores().unwrap(), 0.75);
        assert_eq!(cpu.to_string(), "750m");

        let memory = Quantity::new("1Mi");
        assert_close(memory.to_bytes().unwrap(), 1_048_576.0);
    }
}
