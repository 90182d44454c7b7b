//! Reserve reads against pair contracts.
//!
//! A pair stores its tokens sorted by address, so `getReserves` answers in
//! (token0, token1) order. [`ReserveReader::get_ordered_reserves`] reorients
//! that into (base, quote) as requested by the caller.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use tracing::debug;

use crate::abi::IUniswapV2Pair;
use crate::chain::{call_contract, ChainReader};
use crate::error::{ChainError, EngineError};
use crate::types::Reserves;

/// Descriptive fields of a pair contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairMetadata {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub token0: Address,
    pub token1: Address,
}

#[derive(Clone)]
pub struct ReserveReader {
    reader: Arc<dyn ChainReader>,
}

impl ReserveReader {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self { reader }
    }

    /// Reserves of `pair` ordered so that `reserve_base` belongs to `base`.
    ///
    /// # Errors
    /// - [`EngineError::PairNotFound`] if `pair` has no code.
    /// - [`EngineError::OrderingMismatch`] if the pair does not hold exactly `base` and `quote`.
    /// - [`EngineError::CallFailed`] / [`EngineError::Connectivity`] for failed reads.
    #[tracing::instrument(skip(self), fields(pair = %pair))]
    pub async fn get_ordered_reserves(
        &self,
        pair: Address,
        base: Address,
        quote: Address,
    ) -> Result<Reserves, EngineError> {
        let token0 = self.read(pair, &IUniswapV2Pair::token0Call {}).await?._0;
        let token1 = self.read(pair, &IUniswapV2Pair::token1Call {}).await?._0;
        let raw = self.read(pair, &IUniswapV2Pair::getReservesCall {}).await?;

        let reserve0 = U256::from(raw.reserve0.to::<u128>());
        let reserve1 = U256::from(raw.reserve1.to::<u128>());

        let (reserve_base, reserve_quote) = if token0 == base && token1 == quote {
            (reserve0, reserve1)
        } else if token0 == quote && token1 == base {
            (reserve1, reserve0)
        } else {
            return Err(EngineError::OrderingMismatch {
                pair,
                token0,
                token1,
            });
        };

        debug!(%reserve_base, %reserve_quote, "reserves read");
        Ok(Reserves {
            reserve_base,
            reserve_quote,
            block_timestamp_last: raw.blockTimestampLast,
        })
    }

    /// Name, symbol, LP decimals and both tokens of `pair`.
    #[tracing::instrument(skip(self), fields(pair = %pair))]
    pub async fn pair_metadata(&self, pair: Address) -> Result<PairMetadata, EngineError> {
        let name = self.read(pair, &IUniswapV2Pair::nameCall {}).await?._0;
        let symbol = self.read(pair, &IUniswapV2Pair::symbolCall {}).await?._0;
        let decimals = self.read(pair, &IUniswapV2Pair::decimalsCall {}).await?._0;
        let token0 = self.read(pair, &IUniswapV2Pair::token0Call {}).await?._0;
        let token1 = self.read(pair, &IUniswapV2Pair::token1Call {}).await?._0;

        Ok(PairMetadata {
            address: pair,
            name,
            symbol,
            decimals,
            token0,
            token1,
        })
    }

    async fn read<C: SolCall>(&self, pair: Address, call: &C) -> Result<C::Return, EngineError> {
        call_contract(self.reader.as_ref(), pair, call)
            .await
            .map_err(|error| match error {
                ChainError::EmptyReturn(_) => EngineError::PairNotFound(pair),
                other => EngineError::from_chain(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockPool;
    use crate::test_support::{mock_chain, units, DAI, USDC, USDT, WETH};

    #[tokio::test]
    async fn orders_reserves_when_base_is_token1() {
        // WETH/USDC pair stores USDC as token0.
        let chain = mock_chain();
        let pair = chain.add_pair(WETH, units(1_000, 18), USDC, units(2_500_000, 6));
        let reader = ReserveReader::new(chain.clone());

        let reserves = reader
            .get_ordered_reserves(pair, WETH, USDC)
            .await
            .expect("reserves");
        assert_eq!(reserves.reserve_base, units(1_000, 18));
        assert_eq!(reserves.reserve_quote, units(2_500_000, 6));
    }

    #[tokio::test]
    async fn orders_reserves_when_base_is_token0() {
        let chain = mock_chain();
        let pair = chain.add_pair(WETH, units(400, 18), USDT, units(1_000_000, 6));
        let reader = ReserveReader::new(chain.clone());

        let reserves = reader
            .get_ordered_reserves(pair, WETH, USDT)
            .await
            .expect("reserves");
        assert_eq!(reserves.reserve_base, units(400, 18));
        assert_eq!(reserves.reserve_quote, units(1_000_000, 6));

        let flipped = reader
            .get_ordered_reserves(pair, USDT, WETH)
            .await
            .expect("reserves");
        assert_eq!(flipped.reserve_base, reserves.reserve_quote);
        assert_eq!(flipped.reserve_quote, reserves.reserve_base);
    }

    #[tokio::test]
    async fn foreign_tokens_are_an_ordering_mismatch() {
        let chain = mock_chain();
        let pair = chain.add_pair(WETH, units(1, 18), USDC, units(1, 6));
        let reader = ReserveReader::new(chain.clone());

        let err = reader
            .get_ordered_reserves(pair, WETH, DAI)
            .await
            .expect_err("pair does not hold DAI");
        assert!(matches!(err, EngineError::OrderingMismatch { pair: p, .. } if p == pair));
    }

    #[tokio::test]
    async fn address_without_code_is_pair_not_found() {
        let chain = mock_chain();
        let reader = ReserveReader::new(chain.clone());
        let nowhere = Address::repeat_byte(0x77);

        assert_eq!(
            reader.get_ordered_reserves(nowhere, WETH, USDC).await,
            Err(EngineError::PairNotFound(nowhere))
        );
    }

    #[tokio::test]
    async fn reserves_carry_block_timestamp() {
        let chain = mock_chain();
        let pair = Address::repeat_byte(0x55);
        chain.insert_pool(
            pair,
            MockPool {
                token0: USDC,
                token1: WETH,
                reserve0: U256::from(10u64),
                reserve1: U256::ZERO,
                block_timestamp_last: 42,
            },
        );
        let reader = ReserveReader::new(chain.clone());

        let reserves = reader
            .get_ordered_reserves(pair, WETH, USDC)
            .await
            .expect("reserves");
        assert_eq!(reserves.block_timestamp_last, 42);
        assert!(reserves.is_degenerate());
    }

    #[tokio::test]
    async fn reads_pair_metadata() {
        let chain = mock_chain();
        let pair = chain.add_pair(WETH, units(1, 18), USDC, units(1, 6));
        let reader = ReserveReader::new(chain.clone());

        let meta = reader.pair_metadata(pair).await.expect("metadata");
        assert_eq!(meta.name, "Uniswap V2");
        assert_eq!(meta.symbol, "UNI-V2");
        assert_eq!(meta.decimals, 18);
        assert_eq!((meta.token0, meta.token1), (USDC, WETH));
    }
}
