//! Runtime configuration from `QUOTER_*` environment variables.

use alloy::primitives::Address;
use eyre::{bail, eyre, Result};
use std::str::FromStr;

use crate::abi::addresses;
use crate::decimals::validate_decimals;
use crate::types::{parse_address, TokenDescriptor};

pub const ENV_RPC_URL: &str = "QUOTER_RPC_URL";
pub const ENV_FACTORY: &str = "QUOTER_FACTORY_ADDRESS";
pub const ENV_ROUTER: &str = "QUOTER_ROUTER_ADDRESS";
pub const ENV_BASE_TOKEN: &str = "QUOTER_BASE_TOKEN";
pub const ENV_BASE_DECIMALS: &str = "QUOTER_BASE_DECIMALS";
pub const ENV_BASE_SYMBOL: &str = "QUOTER_BASE_SYMBOL";
pub const ENV_CHAIN: &str = "QUOTER_CHAIN";
pub const ENV_CONCURRENCY: &str = "QUOTER_CONCURRENCY";

const REQUIRED: &[&str] = &[ENV_RPC_URL];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoterConfig {
    pub rpc_url: String,
    pub factory: Address,
    pub router: Address,
    pub base_token: TokenDescriptor,
    pub chain: String,
    pub concurrency: usize,
}

impl QuoterConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables.
    ///
    /// All missing required variables are reported in one error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let address_or = |key: &str, default: Address| -> Result<Address> {
            match get(key) {
                Some(value) => parse_address(&value).map_err(|e| eyre!("{key}: {e}")),
                None => Ok(default),
            }
        };

        let rpc_url = get(ENV_RPC_URL).unwrap_or_default();
        let factory = address_or(ENV_FACTORY, addresses::UNISWAP_V2_FACTORY)?;
        let router = address_or(ENV_ROUTER, addresses::UNISWAP_V2_ROUTER)?;
        let base_address = address_or(ENV_BASE_TOKEN, addresses::WETH)?;
        let base_decimals: u32 = parse_or(get(ENV_BASE_DECIMALS), ENV_BASE_DECIMALS, 18)?;
        validate_decimals(base_decimals).map_err(|e| eyre!("{ENV_BASE_DECIMALS}: {e}"))?;
        let base_symbol = get(ENV_BASE_SYMBOL).unwrap_or_else(|| "WETH".to_string());
        let chain = get(ENV_CHAIN).unwrap_or_else(|| "ethereum".to_string());
        let concurrency: usize = parse_or(get(ENV_CONCURRENCY), ENV_CONCURRENCY, 1)?;

        Ok(Self {
            rpc_url,
            factory,
            router,
            base_token: TokenDescriptor::new(
                &base_address.to_string(),
                &base_symbol,
                base_decimals,
                &chain,
            ),
            chain,
            concurrency: concurrency.max(1),
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("{key}: invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_rpc_is_set() {
        let config = QuoterConfig::from_lookup(lookup(&[(ENV_RPC_URL, "http://localhost:8545")]))
            .expect("config");
        assert_eq!(config.factory, addresses::UNISWAP_V2_FACTORY);
        assert_eq!(config.router, addresses::UNISWAP_V2_ROUTER);
        assert_eq!(config.base_token.symbol, "WETH");
        assert_eq!(config.base_token.decimals, 18);
        assert_eq!(config.chain, "ethereum");
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn missing_rpc_url_is_reported() {
        let err = QuoterConfig::from_lookup(lookup(&[])).expect_err("rpc url required");
        assert!(err.to_string().contains(ENV_RPC_URL));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = QuoterConfig::from_lookup(lookup(&[
            (ENV_RPC_URL, "http://localhost:8545"),
            (ENV_BASE_TOKEN, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            (ENV_BASE_SYMBOL, "USDC"),
            (ENV_BASE_DECIMALS, "6"),
            (ENV_CHAIN, "MegaETH"),
            (ENV_CONCURRENCY, "4"),
        ]))
        .expect("config");
        assert_eq!(config.base_token.symbol, "USDC");
        assert_eq!(config.base_token.decimals, 6);
        assert_eq!(config.base_token.blockchain, "MegaETH");
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = QuoterConfig::from_lookup(lookup(&[
            (ENV_RPC_URL, "http://localhost:8545"),
            (ENV_ROUTER, "0x1234"),
        ]))
        .expect_err("bad router");
        assert!(err.to_string().contains(ENV_ROUTER));

        let err = QuoterConfig::from_lookup(lookup(&[
            (ENV_RPC_URL, "http://localhost:8545"),
            (ENV_CONCURRENCY, "many"),
        ]))
        .expect_err("bad concurrency");
        assert!(err.to_string().contains(ENV_CONCURRENCY));
    }
}
