//! Decimal normalization between raw token integers and human-scale amounts.
//!
//! All arithmetic is done on `U256`. The only `f64` in this module is inside
//! [`format_price`], at the display edge.

use alloy::primitives::U256;

use crate::error::EngineError;
use crate::types::NormalizedAmount;

/// Largest supported decimals count; `10^77` is the largest power of ten in a `U256`.
pub const MAX_DECIMALS: u32 = 77;

/// Prices below this many units (`0.0001`) switch to scientific notation.
const FIXED_DISPLAY_FLOOR_DIGITS: u32 = 4;

/// `10^exp` as a `U256`. Callers keep `exp <= MAX_DECIMALS`.
pub(crate) fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// `10^exp`, or `None` when it does not fit a `U256`.
pub(crate) fn checked_pow10(exp: u32) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

/// Validate a decimals count and narrow it to `u8`.
///
/// # Errors
/// Returns [`EngineError::InvalidDecimals`] if `decimals > 77`.
pub fn validate_decimals(decimals: u32) -> Result<u8, EngineError> {
    if decimals > MAX_DECIMALS {
        return Err(EngineError::InvalidDecimals(decimals));
    }
    Ok(decimals as u8)
}

/// Interpret `raw` as an amount with `decimals` fractional digits.
///
/// # Errors
/// Returns [`EngineError::InvalidDecimals`] if `decimals > 77`.
pub fn normalize(raw: U256, decimals: u32) -> Result<NormalizedAmount, EngineError> {
    let decimals = validate_decimals(decimals)?;
    Ok(NormalizedAmount { raw, decimals })
}

/// Convert `amount` back into a raw integer with `decimals` fractional digits.
///
/// Digits beyond `decimals` are truncated (rounding toward zero).
///
/// # Errors
/// Returns [`EngineError::InvalidDecimals`] for `decimals > 77` and
/// [`EngineError::Overflow`] if the rescaled value does not fit a `U256`.
pub fn denormalize(amount: &NormalizedAmount, decimals: u32) -> Result<U256, EngineError> {
    let target = u32::from(validate_decimals(decimals)?);
    let current = u32::from(amount.decimals);

    if target >= current {
        amount
            .raw
            .checked_mul(pow10(target - current))
            .ok_or(EngineError::Overflow)
    } else {
        Ok(amount.raw / pow10(current - target))
    }
}

/// Parse a human quantity such as `"1"` or `"0.25"` into raw units.
///
/// # Errors
/// Returns [`EngineError::InvalidAmount`] for malformed input, for more
/// fractional digits than the token supports, or for values beyond `U256`.
pub fn parse_amount(text: &str, decimals: u32) -> Result<U256, EngineError> {
    let decimals = u32::from(validate_decimals(decimals)?);
    let invalid = || EngineError::InvalidAmount(text.to_string());

    let trimmed = text.trim();
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (trimmed, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
        || frac_part.len() > decimals as usize
    {
        return Err(invalid());
    }

    let digits = format!(
        "{int_part}{frac_part:0<width$}",
        width = decimals as usize
    );
    U256::from_str_radix(&digits, 10).map_err(|_| invalid())
}

/// Render a price for people.
///
/// Values `>= 0.0001` use four decimal places (`2500.0000`); smaller values use
/// scientific notation with four significant digits (`3.7000e-7`).
pub fn format_price(price: &NormalizedAmount) -> String {
    let value = price.to_f64();
    if is_at_least_display_floor(price) {
        format!("{value:.4}")
    } else {
        format!("{value:.4e}")
    }
}

/// Exact `price >= 0.0001` check, so rounding never flips the display mode.
fn is_at_least_display_floor(price: &NormalizedAmount) -> bool {
    match price.raw.checked_mul(pow10(FIXED_DISPLAY_FLOOR_DIGITS)) {
        Some(scaled) => scaled >= pow10(u32::from(price.decimals)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_oversized_decimals() {
        assert_eq!(
            normalize(U256::from(1u64), 78),
            Err(EngineError::InvalidDecimals(78))
        );
        assert!(normalize(U256::from(1u64), 77).is_ok());
    }

    #[test]
    fn normalize_scales_by_decimals() {
        let amount = normalize(U256::from(1000u64) * pow10(18), 18).expect("valid decimals");
        assert_eq!(amount.to_string(), "1000");
    }

    #[test]
    fn round_trip_is_exact() {
        let samples = [
            (U256::ZERO, 0),
            (U256::from(1u64), 18),
            (U256::from(123_456_789u64), 6),
            (U256::MAX, 77),
            (U256::from(999_999_999_999_999_999u64), 18),
        ];
        for (raw, decimals) in samples {
            let amount = normalize(raw, decimals).expect("valid decimals");
            assert_eq!(denormalize(&amount, decimals), Ok(raw), "raw={raw} d={decimals}");
        }
    }

    #[test]
    fn denormalize_truncates_toward_zero() {
        let amount = normalize(U256::from(1_999_999u64), 6).expect("valid decimals");
        assert_eq!(denormalize(&amount, 0), Ok(U256::from(1u64)));
        assert_eq!(denormalize(&amount, 3), Ok(U256::from(1_999u64)));
    }

    #[test]
    fn denormalize_reports_overflow() {
        let amount = normalize(U256::MAX, 0).expect("valid decimals");
        assert_eq!(denormalize(&amount, 1), Err(EngineError::Overflow));
    }

    #[test]
    fn parse_amount_handles_whole_and_fractional_input() {
        assert_eq!(parse_amount("1", 18), Ok(pow10(18)));
        assert_eq!(parse_amount("1.5", 6), Ok(U256::from(1_500_000u64)));
        assert_eq!(parse_amount(".25", 2), Ok(U256::from(25u64)));
        assert_eq!(parse_amount(" 42 ", 0), Ok(U256::from(42u64)));
    }

    #[test]
    fn parse_amount_rejects_bad_input() {
        for bad in ["", ".", "abc", "1.2.3", "-1", "1e18", "0.0000001"] {
            assert_eq!(
                parse_amount(bad, 6),
                Err(EngineError::InvalidAmount(bad.to_string())),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn format_price_uses_fixed_point_above_floor() {
        let price = normalize(U256::from(2500u64) * pow10(18), 18).expect("valid decimals");
        assert_eq!(format_price(&price), "2500.0000");

        let floor = normalize(pow10(14), 18).expect("valid decimals");
        assert_eq!(format_price(&floor), "0.0001");
    }

    #[test]
    fn format_price_uses_scientific_below_floor() {
        let price = normalize(U256::from(37u64), 8).expect("valid decimals");
        assert_eq!(format_price(&price), "3.7000e-7");
    }
}
