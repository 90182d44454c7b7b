//! ERC-20 and native balance reads, plus declared-decimals verification.

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{info, warn};

use crate::abi::IERC20;
use crate::chain::{call_contract, ChainReader};
use crate::decimals::normalize;
use crate::error::EngineError;
use crate::types::{NormalizedAmount, TokenDescriptor};

/// Decimals of the chain's native coin.
pub const NATIVE_DECIMALS: u32 = 18;

/// Result of comparing a token's configured decimals with `decimals()` on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecimalsCheck {
    Match(u8),
    Mismatch { expected: u32, actual: u8 },
    /// The token could not be read (bad address, no code, revert).
    Unavailable(EngineError),
}

impl DecimalsCheck {
    pub fn is_match(&self) -> bool {
        matches!(self, DecimalsCheck::Match(_))
    }
}

#[derive(Clone)]
pub struct TokenReader {
    reader: Arc<dyn ChainReader>,
}

impl TokenReader {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self { reader }
    }

    /// `decimals()` of `token`.
    pub async fn decimals(&self, token: Address) -> Result<u8, EngineError> {
        call_contract(self.reader.as_ref(), token, &IERC20::decimalsCall {})
            .await
            .map(|ret| ret._0)
            .map_err(EngineError::from_chain)
    }

    /// ERC-20 balance of `owner`, normalized with the token's configured decimals.
    #[tracing::instrument(skip(self))]
    pub async fn balance_of(
        &self,
        token: Address,
        owner: Address,
        decimals: u32,
    ) -> Result<NormalizedAmount, EngineError> {
        let call = IERC20::balanceOfCall { account: owner };
        let balance = call_contract(self.reader.as_ref(), token, &call)
            .await
            .map_err(EngineError::from_chain)?
            ._0;
        normalize(balance, decimals)
    }

    /// Native coin balance of `owner`.
    pub async fn native_balance(&self, owner: Address) -> Result<NormalizedAmount, EngineError> {
        let wei: U256 = self
            .reader
            .native_balance(owner)
            .await
            .map_err(EngineError::from_chain)?;
        normalize(wei, NATIVE_DECIMALS)
    }

    /// Compare `token.decimals` with the on-chain value.
    ///
    /// # Errors
    /// Only [`EngineError::Connectivity`], when the node also fails a ping.
    /// Every other failure is reported as [`DecimalsCheck::Unavailable`].
    pub async fn check_decimals(
        &self,
        token: &TokenDescriptor,
    ) -> Result<DecimalsCheck, EngineError> {
        let address = match token.parsed_address() {
            Ok(address) => address,
            Err(e) => return Ok(DecimalsCheck::Unavailable(e)),
        };

        match self.decimals(address).await {
            Ok(actual) if u32::from(actual) == token.decimals => Ok(DecimalsCheck::Match(actual)),
            Ok(actual) => {
                warn!(token = %token.symbol, expected = token.decimals, actual, "decimals mismatch");
                Ok(DecimalsCheck::Mismatch {
                    expected: token.decimals,
                    actual,
                })
            }
            Err(EngineError::Connectivity(cause)) => {
                self.reader.ping().await.map_err(EngineError::Connectivity)?;
                warn!(token = %token.symbol, error = %cause, "decimals read failed");
                Ok(DecimalsCheck::Unavailable(EngineError::CallFailed(cause)))
            }
            Err(e) => Ok(DecimalsCheck::Unavailable(e)),
        }
    }

    /// Check every token tagged `target_chain`, in input order.
    #[tracing::instrument(skip(self, tokens), fields(tokens = tokens.len()))]
    pub async fn check_universe(
        &self,
        tokens: &[TokenDescriptor],
        target_chain: &str,
    ) -> Result<Vec<(TokenDescriptor, DecimalsCheck)>, EngineError> {
        let mut results = Vec::new();
        for token in tokens.iter().filter(|t| t.blockchain == target_chain) {
            let check = self.check_decimals(token).await?;
            results.push((token.clone(), check));
        }

        let mismatches = results.iter().filter(|(_, c)| !c.is_match()).count();
        info!(checked = results.len(), mismatches, "decimals verification complete");
        Ok(results)
    }
}
