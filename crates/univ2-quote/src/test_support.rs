//! Shared fixtures for unit tests.

use alloy::primitives::{address, Address, U256};
use std::sync::Arc;

use crate::chain::MockChain;
use crate::decimals::pow10;
use crate::types::TokenDescriptor;

pub(crate) const FACTORY: Address = address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
pub(crate) const ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

/// Sorts above USDC and DAI, below USDT.
pub(crate) const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub(crate) const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub(crate) const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub(crate) const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");

pub(crate) fn units(amount: u64, decimals: u32) -> U256 {
    U256::from(amount) * pow10(decimals)
}

pub(crate) fn token(address: Address, symbol: &str, decimals: u32) -> TokenDescriptor {
    TokenDescriptor::new(&address.to_string(), symbol, decimals, "ethereum")
}

pub(crate) fn weth() -> TokenDescriptor {
    token(WETH, "WETH", 18)
}

/// Mainnet-shaped deployment with WETH/USDC (2500 USDC per WETH) and
/// WETH/USDT pools, and decimals registered for every token.
pub(crate) fn mock_chain() -> Arc<MockChain> {
    let chain = Arc::new(MockChain::new(FACTORY, ROUTER));
    chain.set_decimals(WETH, 18);
    chain.set_decimals(USDC, 6);
    chain.set_decimals(DAI, 18);
    chain.set_decimals(USDT, 6);
    chain.add_pair(WETH, units(1_000, 18), USDC, units(2_500_000, 6));
    chain.add_pair(WETH, units(400, 18), USDT, units(1_000_000, 6));
    chain
}
