//! Conversion between display amounts and token base units.
//!
//! Booking prices are quoted in display units (`100.25` USDC) while ledgers
//! transfer integer base units (`100_250_000` for a 6-decimal token).
//!
//! Rounding is pinned to **round half up** (midpoint away from zero): the
//! scaled amount is rounded to the nearest integer and exact midpoints go up.
//! Negative amounts are rejected, so "away from zero" and "up" coincide.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimals of the stablecoins accepted for on-chain payment.
pub const STABLECOIN_DECIMALS: u32 = 6;

/// Errors converting between display amounts and base units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The amount is below zero.
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in `u64` base units.
    #[error("amount {amount} with {decimals} decimals overflows u64 base units")]
    Overflow {
        /// Display amount.
        amount: Decimal,
        /// Token decimals.
        decimals: u32,
    },
    /// The token declares more decimals than can be represented.
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u32),
    /// The amount is not a finite number.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// Converts a display amount to base units of a token with `decimals` decimals.
///
/// # Errors
///
/// Returns [`AmountError`] if the amount is negative or does not fit in `u64`.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<u64, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }
    let factor = 10_u64
        .checked_pow(decimals)
        .map(Decimal::from)
        .ok_or(AmountError::UnsupportedDecimals(decimals))?;
    let overflow = || AmountError::Overflow { amount, decimals };
    amount
        .checked_mul(factor)
        .ok_or_else(overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or_else(overflow)
}

/// Converts a display amount held as `f64` to base units.
///
/// The float is first converted to its shortest decimal representation, so
/// `1.234567` converts to exactly `1_234_567` micro-units.
///
/// # Errors
///
/// Returns [`AmountError`] for non-finite, negative or oversized amounts.
pub fn f64_to_base_units(amount: f64, decimals: u32) -> Result<u64, AmountError> {
    let amount = Decimal::try_from(amount).map_err(|e| AmountError::Invalid(e.to_string()))?;
    to_base_units(amount, decimals)
}

/// Converts base units back to a display amount.
///
/// # Errors
///
/// Returns [`AmountError::UnsupportedDecimals`] if `decimals` exceeds the
/// precision of [`Decimal`].
pub fn from_base_units(units: u64, decimals: u32) -> Result<Decimal, AmountError> {
    Decimal::try_from_i128_with_scale(i128::from(units), decimals)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::UnsupportedDecimals(decimals))
}

/// Parses a display amount such as `"100.25"`.
///
/// # Errors
///
/// Returns [`AmountError::Invalid`] if the string is not a decimal number, or
/// [`AmountError::Negative`] for negative amounts.
pub fn parse_amount(value: &str) -> Result<Decimal, AmountError> {
    let amount =
        Decimal::from_str(value.trim()).map_err(|e| AmountError::Invalid(format!("{value}: {e}")))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_base_units_exact() {
        assert_eq!(to_base_units(dec("1.234567"), 6), Ok(1_234_567));
        assert_eq!(to_base_units(dec("100"), 6), Ok(100_000_000));
        assert_eq!(to_base_units(dec("0"), 6), Ok(0));
    }

    #[test]
    fn test_sub_unit_amount_rounds_to_zero() {
        assert_eq!(to_base_units(dec("0.0000001"), 6), Ok(0));
        assert_eq!(f64_to_base_units(0.000_000_1, 6), Ok(0));
    }

    #[test]
    fn test_f64_conversion() {
        assert_eq!(f64_to_base_units(1.234_567, 6), Ok(1_234_567));
        assert_eq!(f64_to_base_units(0.1, 6), Ok(100_000));
        assert!(f64_to_base_units(f64::NAN, 6).is_err());
        assert!(f64_to_base_units(f64::INFINITY, 6).is_err());
    }

    #[test]
    fn test_midpoints_round_half_up() {
        assert_eq!(to_base_units(dec("0.0000005"), 6), Ok(1));
        // Half-to-even would give 2 here.
        assert_eq!(to_base_units(dec("0.0000025"), 6), Ok(3));
        assert_eq!(to_base_units(dec("0.0000024999"), 6), Ok(2));
        assert_eq!(to_base_units(dec("1.9999995"), 6), Ok(2_000_000));
    }

    #[test]
    fn test_round_trip_six_decimals() {
        for value in [
            "0.000001",
            "0.5",
            "1.234567",
            "19.99",
            "250.000001",
            "999999.999999",
            "18446744073709.551615",
        ] {
            let amount = dec(value);
            let units = to_base_units(amount, STABLECOIN_DECIMALS).unwrap();
            let back = from_base_units(units, STABLECOIN_DECIMALS).unwrap();
            assert_eq!(back, amount.normalize(), "round trip of {value}");
        }
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(
            to_base_units(dec("-0.01"), 6),
            Err(AmountError::Negative(dec("-0.01")))
        );
        assert!(matches!(
            parse_amount("-5"),
            Err(AmountError::Negative(_))
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(matches!(
            to_base_units(dec("18446744073709.551616"), 6),
            Err(AmountError::Overflow { .. })
        ));
        assert_eq!(
            to_base_units(dec("1"), 20),
            Err(AmountError::UnsupportedDecimals(20))
        );
    }

    #[test]
    fn test_zero_decimals() {
        assert_eq!(to_base_units(dec("41.5"), 0), Ok(42));
        assert_eq!(from_base_units(42, 0), Ok(dec("42")));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 100.25 "), Ok(dec("100.25")));
        assert!(matches!(parse_amount("ten"), Err(AmountError::Invalid(_))));
    }
}
