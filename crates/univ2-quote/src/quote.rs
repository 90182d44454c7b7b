//! Swap quotes from the Uniswap V2 router.
//!
//! `getAmountsOut` already applies the pool fee, so the router is the single
//! source of truth for executable output amounts.

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::abi::IUniswapV2Router02;
use crate::chain::{call_contract, ChainReader};
use crate::decimals::{normalize, validate_decimals};
use crate::error::EngineError;
use crate::types::{NormalizedAmount, Quote, TokenDescriptor};

#[derive(Clone)]
pub struct QuoteCalculator {
    reader: Arc<dyn ChainReader>,
    router: Address,
}

impl QuoteCalculator {
    pub fn new(reader: Arc<dyn ChainReader>, router: Address) -> Self {
        Self { reader, router }
    }

    pub fn router(&self) -> Address {
        self.router
    }

    /// Output of swapping `amount_in` raw units of `token_in` for `token_out`
    /// along the direct path, normalized by `out_decimals`.
    ///
    /// # Errors
    /// - [`EngineError::InvalidDecimals`] before any chain call if `out_decimals > 77`.
    /// - [`EngineError::QuoteUnavailable`] if the router reverts or returns no amounts.
    /// - [`EngineError::Connectivity`] if the node is unreachable.
    #[tracing::instrument(skip(self), fields(router = %self.router))]
    pub async fn quote_amount_out(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        out_decimals: u32,
    ) -> Result<NormalizedAmount, EngineError> {
        validate_decimals(out_decimals)?;

        let call = IUniswapV2Router02::getAmountsOutCall {
            amountIn: amount_in,
            path: vec![token_in, token_out],
        };

        let ret = call_contract(self.reader.as_ref(), self.router, &call)
            .await
            .map_err(|error| {
                if error.is_connectivity() {
                    EngineError::Connectivity(error)
                } else {
                    warn!(error = %error, "getAmountsOut failed");
                    EngineError::QuoteUnavailable(error.to_string())
                }
            })?;

        let amount_out = ret.amounts.last().copied().ok_or_else(|| {
            EngineError::QuoteUnavailable("router returned no amounts".to_string())
        })?;

        debug!(%amount_out, "quote received");
        normalize(amount_out, out_decimals)
    }

    /// Full quote between two configured tokens.
    ///
    /// `amount_in` is in raw units of `token_in`.
    pub async fn quote(
        &self,
        amount_in: U256,
        token_in: &TokenDescriptor,
        token_out: &TokenDescriptor,
    ) -> Result<Quote, EngineError> {
        let in_address = token_in.parsed_address()?;
        let out_address = token_out.parsed_address()?;
        let normalized_in = normalize(amount_in, token_in.decimals)?;

        let amount_out = self
            .quote_amount_out(amount_in, in_address, out_address, token_out.decimals)
            .await?;

        Ok(Quote {
            amount_in: normalized_in,
            token_in: in_address,
            amount_out,
            token_out: out_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_chain, token, units, weth, DAI, ROUTER, USDC, WETH};

    #[tokio::test]
    async fn quotes_one_weth_for_usdc() {
        let chain = mock_chain();
        let quoter = QuoteCalculator::new(chain.clone(), ROUTER);

        let out = quoter
            .quote_amount_out(units(1, 18), WETH, USDC, 6)
            .await
            .expect("quote");
        // 1 WETH into 1000 WETH / 2.5M USDC after the 0.3% fee.
        assert_eq!(out.raw, U256::from(2_490_017_452u64));
        assert_eq!(out.to_string(), "2490.017452");
    }

    #[tokio::test]
    async fn missing_pair_is_quote_unavailable() {
        let chain = mock_chain();
        let quoter = QuoteCalculator::new(chain.clone(), ROUTER);

        let err = quoter
            .quote_amount_out(units(1, 18), WETH, DAI, 18)
            .await
            .expect_err("no WETH/DAI pool");
        assert!(matches!(err, EngineError::QuoteUnavailable(_)));
    }

    #[tokio::test]
    async fn zero_input_is_quote_unavailable() {
        let chain = mock_chain();
        let quoter = QuoteCalculator::new(chain.clone(), ROUTER);

        let err = quoter
            .quote_amount_out(U256::ZERO, WETH, USDC, 6)
            .await
            .expect_err("router rejects zero input");
        assert!(matches!(err, EngineError::QuoteUnavailable(_)));
    }

    #[tokio::test]
    async fn invalid_decimals_fail_before_calling_router() {
        let chain = mock_chain();
        let quoter = QuoteCalculator::new(chain.clone(), ROUTER);

        assert_eq!(
            quoter.quote_amount_out(units(1, 18), WETH, USDC, 78).await,
            Err(EngineError::InvalidDecimals(78))
        );
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn offline_node_is_connectivity() {
        let chain = mock_chain();
        chain.set_offline(true);
        let quoter = QuoteCalculator::new(chain.clone(), ROUTER);

        let err = quoter
            .quote_amount_out(units(1, 18), WETH, USDC, 6)
            .await
            .expect_err("offline");
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn quote_between_descriptors() {
        let chain = mock_chain();
        let quoter = QuoteCalculator::new(chain.clone(), ROUTER);
        let usdc = token(USDC, "USDC", 6);

        let quote = quoter.quote(units(1, 18), &weth(), &usdc).await.expect("quote");
        assert_eq!(quote.amount_in.to_string(), "1");
        assert_eq!(quote.token_in, WETH);
        assert_eq!(quote.token_out, USDC);
        assert!(!quote.amount_out.is_zero());
    }
}
