//! # Utility Functions
//!
//! Parsing and formatting helpers shared by the engine's display surfaces.

use crate::error::{EngineError, Result};
use crate::PRICE_DECIMALS;

/// Parse a decimal price string ("65000", "65000.5", ".25") into
/// normalized fixed-decimal units.
pub fn parse_price(s: &str) -> Result<u128> {
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next().unwrap_or("");
    if whole.is_empty() && frac.is_empty() {
        return Err(EngineError::Validation(format!("invalid price: {s:?}")));
    }
    if frac.len() > PRICE_DECIMALS as usize {
        return Err(EngineError::Validation(format!(
            "price {s:?} has more than {PRICE_DECIMALS} decimal places"
        )));
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| EngineError::Validation(format!("invalid price: {s:?}")))?
    };
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = PRICE_DECIMALS as usize);
        padded
            .parse()
            .map_err(|_| EngineError::Validation(format!("invalid price: {s:?}")))?
    };
    whole
        .checked_mul(10u128.pow(PRICE_DECIMALS))
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(|| EngineError::Validation(format!("price {s:?} out of range")))
}

/// Format normalized fixed-decimal units back into a decimal string.
pub fn format_price(units: u128) -> String {
    let scale = 10u128.pow(PRICE_DECIMALS);
    let whole = units / scale;
    let frac = units % scale;
    if frac == 0 {
        whole.to_string()
    } else {
        let s = format!("{whole}.{frac:0width$}", width = PRICE_DECIMALS as usize);
        s.trim_end_matches('0').to_string()
    }
}

/// Format a unix timestamp as a human-readable UTC string.
pub fn format_timestamp(timestamp: u64) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("@{timestamp}"))
}

/// Parse a unix timestamp from a string.
pub fn parse_timestamp(timestamp_str: &str) -> Result<u64> {
    timestamp_str
        .parse::<u64>()
        .map_err(|_| EngineError::Validation(format!("invalid timestamp: {timestamp_str}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_forms() {
        assert_eq!(parse_price("65000").unwrap(), 6_500_000_000_000);
        assert_eq!(parse_price("65000.5").unwrap(), 6_500_050_000_000);
        assert_eq!(parse_price("0.00000001").unwrap(), 1);
        assert_eq!(parse_price(".25").unwrap(), 25_000_000);
        assert_eq!(parse_price("3.").unwrap(), 300_000_000);
        assert_eq!(parse_price("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        assert!(parse_price("").is_err());
        assert!(parse_price(".").is_err());
        assert!(parse_price("abc").is_err());
        assert!(parse_price("-5").is_err(), "prices are unsigned");
        assert!(parse_price("1.2.3").is_err());
        assert!(
            parse_price("0.000000001").is_err(),
            "nine decimal places exceed the scale"
        );
    }

    #[test]
    fn test_format_price_trims_zeros() {
        assert_eq!(format_price(6_500_000_000_000), "65000");
        assert_eq!(format_price(6_500_050_000_000), "65000.5");
        assert_eq!(format_price(105_000_000), "1.05");
        assert_eq!(format_price(1), "0.00000001");
        assert_eq!(format_price(0), "0");
    }

    #[test]
    fn test_price_roundtrip() {
        for s in ["65000", "0.5", "123.456", "0.00000001"] {
            assert_eq!(format_price(parse_price(s).unwrap()), s, "roundtrip {s}");
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(1_735_689_600), "2025-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1735689600").unwrap(), 1_735_689_600);
        assert!(parse_timestamp("not-a-number").is_err());
        assert!(parse_timestamp("-5").is_err());
    }
}
