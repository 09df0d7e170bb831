//! # Oracle Prices
//!
//! Price feeds quote `mantissa * 10^exponent`. Resolution normalizes the
//! reading to a fixed 8-decimal scale and compares it against the event's
//! target, so two feeds quoting the same price at different exponents
//! settle identically.

use crate::error::{EngineError, Result};
use crate::id::FeedId;
use crate::PRICE_DECIMALS;
use serde::{Deserialize, Serialize};

/// Outcome index that wins when the price reaches the target.
pub const OUTCOME_ABOVE: usize = 0;
/// Outcome index that wins when the price falls short.
pub const OUTCOME_BELOW: usize = 1;

/// One reading from an external price feed.
///
/// The engine trusts a reading only after its feed id matches the one the
/// event pinned at creation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceReading {
    pub feed_id: FeedId,
    pub mantissa: u64,
    pub exponent: i32,
}

impl PriceReading {
    pub fn new(feed_id: FeedId, mantissa: u64, exponent: i32) -> Self {
        Self {
            feed_id,
            mantissa,
            exponent,
        }
    }

    /// Build a reading from a feed that quotes signed mantissas.
    ///
    /// Negative prices have no meaning for the assets these markets track;
    /// a negative mantissa is rejected outright rather than clamped, since
    /// a clamp could silently resolve an event the wrong way.
    pub fn from_signed(feed_id: FeedId, mantissa: i64, exponent: i32) -> Result<Self> {
        if mantissa < 0 {
            return Err(EngineError::Validation(format!(
                "negative price reading {mantissa} rejected"
            )));
        }
        Ok(Self::new(feed_id, mantissa as u64, exponent))
    }

    /// Normalize this reading to [`PRICE_DECIMALS`] fixed decimals.
    pub fn normalized(&self) -> Result<u128> {
        normalize(self.mantissa, self.exponent, PRICE_DECIMALS)
    }
}

/// Scale `mantissa * 10^exponent` to `decimals` fixed decimal places.
///
/// Downscaling floors away precision beyond the target scale; upscaling
/// multiplies and errors on overflow instead of wrapping.
pub fn normalize(mantissa: u64, exponent: i32, decimals: u32) -> Result<u128> {
    let value = u128::from(mantissa);
    if exponent >= 0 {
        // Whole-unit quote: shift up by the exponent plus the full scale.
        let factor = pow10(exponent.unsigned_abs() + decimals)
            .ok_or_else(|| out_of_range(mantissa, exponent))?;
        return value
            .checked_mul(factor)
            .ok_or_else(|| out_of_range(mantissa, exponent));
    }

    let magnitude = exponent.unsigned_abs();
    if magnitude == decimals {
        Ok(value)
    } else if magnitude > decimals {
        match pow10(magnitude - decimals) {
            Some(divisor) => Ok(value / divisor),
            // Divisor beyond u128 range: any 64-bit mantissa floors to zero.
            None => Ok(0),
        }
    } else {
        let factor =
            pow10(decimals - magnitude).ok_or_else(|| out_of_range(mantissa, exponent))?;
        value
            .checked_mul(factor)
            .ok_or_else(|| out_of_range(mantissa, exponent))
    }
}

/// Winning outcome index for a normalized price against a target.
///
/// An exact hit counts as above: the event asks "did the price reach the
/// target", and reaching it exactly answers yes.
pub fn verdict(normalized_price: u128, target_price: u128) -> usize {
    if normalized_price >= target_price {
        OUTCOME_ABOVE
    } else {
        OUTCOME_BELOW
    }
}

/// Outcome labels every price-driven event carries, in index order.
pub fn price_outcome_labels() -> Vec<String> {
    vec!["Above".to_string(), "Below".to_string()]
}

fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

fn out_of_range(mantissa: u64, exponent: i32) -> EngineError {
    EngineError::Validation(format!(
        "price {mantissa}e{exponent} does not fit the normalized scale"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_matching_exponent() {
        // 65_123.45 quoted at 8 decimals already.
        assert_eq!(normalize(6_512_345_000_000, -8, 8).unwrap(), 6_512_345_000_000);
    }

    #[test]
    fn test_normalize_downscales_with_floor() {
        // 1.2345678901 quoted at 10 decimals: the trailing 01 floors away.
        assert_eq!(normalize(12_345_678_901, -10, 8).unwrap(), 123_456_789);
        // 9999 at 12 decimals is below one normalized unit.
        assert_eq!(normalize(9_999, -12, 8).unwrap(), 0);
    }

    #[test]
    fn test_normalize_upscales() {
        // 42.5 quoted at 1 decimal.
        assert_eq!(normalize(425, -1, 8).unwrap(), 4_250_000_000);
        // Whole-unit quote: 67 dollars.
        assert_eq!(normalize(67, 0, 8).unwrap(), 6_700_000_000);
        // Positive exponent: 67 * 10^3.
        assert_eq!(normalize(67, 3, 8).unwrap(), 6_700_000_000_000);
    }

    #[test]
    fn test_normalize_extreme_exponents() {
        // Deeply negative exponent floors to zero instead of erroring.
        assert_eq!(normalize(u64::MAX, -100, 8).unwrap(), 0);
        // Huge positive exponent cannot be represented.
        assert!(normalize(1, 100, 8).is_err());
        // Zero mantissa normalizes to zero at any representable exponent.
        assert_eq!(normalize(0, 5, 8).unwrap(), 0);
    }

    #[test]
    fn test_from_signed_rejects_negative() {
        let feed = FeedId::new([7; 32]);
        assert!(PriceReading::from_signed(feed, -1, -8).is_err());
        let reading = PriceReading::from_signed(feed, 42, -8).unwrap();
        assert_eq!(reading.mantissa, 42);
    }

    #[test]
    fn test_verdict_tie_goes_above() {
        assert_eq!(verdict(100, 100), OUTCOME_ABOVE, "exact hit reaches the target");
        assert_eq!(verdict(101, 100), OUTCOME_ABOVE);
        assert_eq!(verdict(99, 100), OUTCOME_BELOW);
    }

    #[test]
    fn test_equivalent_quotes_settle_identically() {
        // 65000 quoted three ways.
        let a = normalize(65_000, 0, 8).unwrap();
        let b = normalize(6_500_000_000_000, -8, 8).unwrap();
        let c = normalize(65_000_000_000_000_000, -12, 8).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}
