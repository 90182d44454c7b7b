//! Shared test helpers and utilities.
//!
//! Factory functions for a fake Uniswap V2 deployment and token descriptors
//! with sensible defaults.

#![allow(dead_code)]

use alloy::primitives::{address, Address, U256};
use std::sync::Arc;
use univ2_quote::chain::MockChain;
use univ2_quote::TokenDescriptor;

pub const FACTORY: Address = address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
pub const ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
pub const WBTC: Address = address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");

/// `amount * 10^decimals`.
pub fn units(amount: u64, decimals: u32) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(decimals))
}

/// Descriptor tagged `ethereum`, with the address in lowercase to exercise
/// canonicalization.
pub fn token(address: Address, symbol: &str, decimals: u32) -> TokenDescriptor {
    let lowercase = format!("0x{}", alloy::hex::encode(address));
    TokenDescriptor::new(&lowercase, symbol, decimals, "ethereum")
}

pub fn weth() -> TokenDescriptor {
    token(WETH, "WETH", 18)
}

/// Creates a fake chain with WETH/USDC and WETH/USDT pools priced at
/// 2500 quote per WETH, and decimals registered for every token.
///
/// # Example
/// ```ignore
/// let chain = sample_chain();
/// let resolver = PairResolver::new(chain.clone(), FACTORY);
/// ```
pub fn sample_chain() -> Arc<MockChain> {
    let chain = Arc::new(MockChain::new(FACTORY, ROUTER));
    for (token, decimals) in [(WETH, 18), (USDC, 6), (DAI, 18), (USDT, 6), (WBTC, 8)] {
        chain.set_decimals(token, decimals);
    }
    chain.add_pair(WETH, units(1_000, 18), USDC, units(2_500_000, 6));
    chain.add_pair(WETH, units(400, 18), USDT, units(1_000_000, 6));
    chain
}

/// USDC, DAI (no pool) and USDT, in that order.
pub fn sample_universe() -> Vec<TokenDescriptor> {
    vec![
        token(USDC, "USDC", 6),
        token(DAI, "DAI", 18),
        token(USDT, "USDT", 6),
    ]
}
