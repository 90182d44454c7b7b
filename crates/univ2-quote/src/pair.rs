//! Pair discovery through the Uniswap V2 factory.

use alloy::primitives::Address;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::abi::IUniswapV2Factory;
use crate::chain::{call_contract, ChainReader};
use crate::types::PairQueryResult;

/// Looks up pair contracts with `factory.getPair`.
#[derive(Clone)]
pub struct PairResolver {
    reader: Arc<dyn ChainReader>,
    factory: Address,
}

impl PairResolver {
    pub fn new(reader: Arc<dyn ChainReader>, factory: Address) -> Self {
        Self { reader, factory }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Pair address for `token_a`/`token_b`, in either argument order.
    ///
    /// The zero address from the factory maps to [`PairQueryResult::NotFound`];
    /// failed calls are returned as [`PairQueryResult::CallFailed`] and never panic.
    #[tracing::instrument(skip(self), fields(factory = %self.factory))]
    pub async fn resolve_pair(&self, token_a: Address, token_b: Address) -> PairQueryResult {
        let call = IUniswapV2Factory::getPairCall {
            tokenA: token_a,
            tokenB: token_b,
        };

        match call_contract(self.reader.as_ref(), self.factory, &call).await {
            Ok(ret) if ret.pair.is_zero() => {
                debug!("no pair deployed");
                PairQueryResult::NotFound
            }
            Ok(ret) => {
                debug!(pair = %ret.pair, "pair found");
                PairQueryResult::Found(ret.pair)
            }
            Err(error) => {
                warn!(error = %error, "getPair failed");
                PairQueryResult::CallFailed(error)
            }
        }
    }
}
