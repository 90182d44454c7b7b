//! Integer-only spot price from ordered pair reserves.
//!
//! ## Math
//!
//! With reserves normalized by their token decimals, the spot price of one
//! base token in quote tokens is
//!
//! ```text
//! price = (reserve_quote / 10^quote_decimals) / (reserve_base / 10^base_decimals)
//! ```
//!
//! Kept as an integer with [`PRICE_DECIMALS`] fractional digits:
//!
//! ```text
//! price_raw = reserve_quote * 10^(base_decimals + 18 - quote_decimals) / reserve_base
//! ```
//!
//! When the exponent is negative it moves to the denominator. Division
//! truncates, so prices are exact to 18 decimal places.

use alloy::primitives::U256;

use crate::decimals::{checked_pow10, normalize, validate_decimals};
use crate::error::EngineError;
use crate::types::{NormalizedAmount, Reserves};

/// Fractional digits carried by computed prices.
pub const PRICE_DECIMALS: u32 = 18;

/// Quote tokens per one base token.
///
/// # Errors
/// - [`EngineError::InvalidDecimals`] if either decimals count exceeds 77.
/// - [`EngineError::DivisionByZero`] if either reserve is zero. A pool with
///   one empty side has no meaningful price.
/// - [`EngineError::Overflow`] if scaling the quote reserve exceeds `U256`.
pub fn compute_price(
    reserves: &Reserves,
    base_decimals: u32,
    quote_decimals: u32,
) -> Result<NormalizedAmount, EngineError> {
    let base_decimals = u32::from(validate_decimals(base_decimals)?);
    let quote_decimals = u32::from(validate_decimals(quote_decimals)?);

    if reserves.is_degenerate() {
        return Err(EngineError::DivisionByZero);
    }

    let scale_up = base_decimals + PRICE_DECIMALS;
    let (numerator, denominator) = if scale_up >= quote_decimals {
        let factor = checked_pow10(scale_up - quote_decimals).ok_or(EngineError::Overflow)?;
        let numerator = reserves
            .reserve_quote
            .checked_mul(factor)
            .ok_or(EngineError::Overflow)?;
        (numerator, reserves.reserve_base)
    } else {
        let factor = checked_pow10(quote_decimals - scale_up).ok_or(EngineError::Overflow)?;
        let denominator = reserves
            .reserve_base
            .checked_mul(factor)
            .ok_or(EngineError::Overflow)?;
        (reserves.reserve_quote, denominator)
    };

    normalize(numerator / denominator, PRICE_DECIMALS)
}

/// Inverse view: base tokens per one quote token.
///
/// # Errors
/// Same as [`compute_price`].
pub fn compute_inverse_price(
    reserves: &Reserves,
    base_decimals: u32,
    quote_decimals: u32,
) -> Result<NormalizedAmount, EngineError> {
    let flipped = Reserves {
        reserve_base: reserves.reserve_quote,
        reserve_quote: reserves.reserve_base,
        block_timestamp_last: reserves.block_timestamp_last,
    };
    compute_price(&flipped, quote_decimals, base_decimals)
}
