//! Value types shared by the quoting components.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// A token entry of the configured universe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    /// Contract address as configured; any hex casing is accepted.
    pub address: String,
    /// Ticker symbol, display only.
    pub symbol: String,
    /// Declared decimals used to normalize raw amounts.
    pub decimals: u32,
    /// Network tag used to filter the universe before scanning.
    pub blockchain: String,
}

impl TokenDescriptor {
    pub fn new(address: &str, symbol: &str, decimals: u32, blockchain: &str) -> Self {
        Self {
            address: address.to_string(),
            symbol: symbol.to_string(),
            decimals,
            blockchain: blockchain.to_string(),
        }
    }

    /// Canonical address of this token.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidAddress`] if the configured string is not a 20-byte hex address.
    pub fn parsed_address(&self) -> Result<Address, EngineError> {
        parse_address(&self.address)
    }
}

impl fmt::Display for TokenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

/// Parse an address in any casing, with or without `0x`.
///
/// The returned [`Address`] displays in checksummed form, which is what every
/// chain call uses.
pub fn parse_address(value: &str) -> Result<Address, EngineError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| EngineError::InvalidAddress(value.to_string()))
}

/// Outcome of a factory pair lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairQueryResult {
    NotFound,
    Found(Address),
    CallFailed(crate::error::ChainError),
}

impl PairQueryResult {
    pub fn pair_address(&self) -> Option<Address> {
        match self {
            PairQueryResult::Found(pair) => Some(*pair),
            _ => None,
        }
    }
}

/// Pair reserves ordered as (base, quote) from the caller's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reserves {
    pub reserve_base: U256,
    pub reserve_quote: U256,
    /// `blockTimestampLast` reported by the pair; not used for pricing.
    pub block_timestamp_last: u32,
}

impl Reserves {
    /// A pool with either side empty has no usable price.
    pub fn is_degenerate(&self) -> bool {
        self.reserve_base.is_zero() || self.reserve_quote.is_zero()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.block_timestamp_last), 0)
    }
}

/// Exact human-scale amount: `raw / 10^decimals`.
///
/// Built by [`crate::decimals::normalize`], which guarantees `decimals <= 77`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NormalizedAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl NormalizedAmount {
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Lossy conversion for display and threshold formatting only.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse::<f64>().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for NormalizedAmount {
    /// Exact decimal rendering with trailing fractional zeros removed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.raw.to_string();
        let decimals = usize::from(self.decimals);
        if decimals == 0 {
            return f.write_str(&digits);
        }

        let padded = format!("{digits:0>width$}", width = decimals + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            f.write_str(int_part)
        } else {
            write!(f, "{int_part}.{frac_part}")
        }
    }
}

/// Expected output of a single-hop swap of `amount_in` of `token_in`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: NormalizedAmount,
    pub token_in: Address,
    pub amount_out: NormalizedAmount,
    pub token_out: Address,
}

/// Per-token record produced by a universe scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOutcome {
    pub token: TokenDescriptor,
    pub pair_exists: bool,
    pub pair_address: Option<Address>,
    pub quote: Option<Quote>,
    /// Only populated when the scan reads reserves.
    pub reserves: Option<Reserves>,
    /// Quote tokens per base token; only populated when the scan reads reserves.
    pub price: Option<NormalizedAmount>,
    pub error: Option<EngineError>,
}

impl ScanOutcome {
    pub(crate) fn empty(token: TokenDescriptor) -> Self {
        Self {
            token,
            pair_exists: false,
            pair_address: None,
            quote: None,
            reserves: None,
            price: None,
            error: None,
        }
    }
}
