//! univ2-quote: read-only Uniswap V2 quote and liquidity discovery.
//!
//! Resolves pairs through the factory, reads ordered reserves, computes spot
//! prices and router quotes, and scans a token universe for pairs against a
//! base token. All chain access goes through [`chain::ChainReader`].

pub mod abi;
pub mod chain;
pub mod config;
pub mod decimals;
pub mod error;
pub mod pair;
pub mod price;
pub mod quote;
pub mod reserves;
pub mod scanner;
pub mod token;
pub mod types;
pub mod universe;

#[cfg(test)]
mod test_support;

pub use chain::{ChainReader, MockChain, RpcChainReader};
pub use config::QuoterConfig;
pub use error::{ChainError, EngineError};
pub use pair::PairResolver;
pub use price::{compute_price, PRICE_DECIMALS};
pub use quote::QuoteCalculator;
pub use reserves::{PairMetadata, ReserveReader};
pub use scanner::{ScanConfig, ScanSummary, TokenUniverseScanner};
pub use token::{DecimalsCheck, TokenReader};
pub use types::{NormalizedAmount, PairQueryResult, Quote, Reserves, ScanOutcome, TokenDescriptor};
pub use universe::{load_token_universe, TokenListFormat};
