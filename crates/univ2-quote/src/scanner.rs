//! Liquidity discovery across a token universe.
//!
//! For every token tagged with the target chain (except the base itself) the
//! scanner resolves the base/token pair, quotes the configured input amount
//! and optionally reads reserves and the spot price. Failures are recorded on
//! the token's [`ScanOutcome`]; only connectivity loss aborts the scan.

use alloy::primitives::{Address, U256};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::chain::ChainReader;
use crate::error::EngineError;
use crate::pair::PairResolver;
use crate::price::compute_price;
use crate::quote::QuoteCalculator;
use crate::reserves::ReserveReader;
use crate::types::{PairQueryResult, ScanOutcome, TokenDescriptor};

/// Scan parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// Only tokens whose `blockchain` equals this tag are scanned.
    pub target_chain: String,
    /// Tokens processed at once. Output order never depends on it.
    pub concurrency: usize,
    /// Also read reserves and compute spot prices.
    pub include_reserves: bool,
}

impl ScanConfig {
    pub fn new(target_chain: &str) -> Self {
        Self {
            target_chain: target_chain.to_string(),
            concurrency: 1,
            include_reserves: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_reserves(mut self, include_reserves: bool) -> Self {
        self.include_reserves = include_reserves;
        self
    }
}

/// Aggregate counts over a finished scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub scanned: usize,
    pub pairs_found: usize,
    pub quoted: usize,
    pub errors: usize,
}

impl ScanSummary {
    pub fn from_outcomes(outcomes: &[ScanOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            summary.scanned += 1;
            summary.pairs_found += usize::from(outcome.pair_exists);
            summary.quoted += usize::from(outcome.quote.is_some());
            summary.errors += usize::from(outcome.error.is_some());
            summary
        })
    }
}

pub struct TokenUniverseScanner {
    reader: Arc<dyn ChainReader>,
    resolver: PairResolver,
    quoter: QuoteCalculator,
    reserves: ReserveReader,
    config: ScanConfig,
}

impl TokenUniverseScanner {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        factory: Address,
        router: Address,
        config: ScanConfig,
    ) -> Self {
        Self {
            resolver: PairResolver::new(reader.clone(), factory),
            quoter: QuoteCalculator::new(reader.clone(), router),
            reserves: ReserveReader::new(reader.clone()),
            reader,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Tokens of `tokens` that a scan against `base` would visit, in input order.
    pub fn candidates<'t>(
        &self,
        base: Address,
        tokens: &'t [TokenDescriptor],
    ) -> Vec<&'t TokenDescriptor> {
        tokens
            .iter()
            .filter(|token| token.blockchain == self.config.target_chain)
            .filter(|token| token.parsed_address().map_or(true, |address| address != base))
            .collect()
    }

    /// Scan `tokens` for pairs against `base_token`, quoting `amount_in` raw
    /// units of the base token into each of them.
    ///
    /// Returns one outcome per candidate, in the order of `tokens`.
    ///
    /// # Errors
    /// - [`EngineError::InvalidAddress`] if the base token address is malformed.
    /// - [`EngineError::Connectivity`] if the node becomes unreachable mid-scan.
    #[tracing::instrument(
        skip_all,
        fields(base = %base_token.symbol, chain = %self.config.target_chain, tokens = tokens.len())
    )]
    pub async fn scan(
        &self,
        base_token: &TokenDescriptor,
        tokens: &[TokenDescriptor],
        amount_in: U256,
    ) -> Result<Vec<ScanOutcome>, EngineError> {
        let base = base_token.parsed_address()?;
        let candidates = self.candidates(base, tokens);
        info!(candidates = candidates.len(), "scanning token universe");

        let outcomes: Vec<ScanOutcome> = stream::iter(candidates)
            .map(|token| self.scan_token(base_token, base, token, amount_in))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await
            .map_err(|e| {
                error!(error = %e, "scan aborted");
                e
            })?;

        let summary = ScanSummary::from_outcomes(&outcomes);
        info!(
            scanned = summary.scanned,
            pairs_found = summary.pairs_found,
            quoted = summary.quoted,
            errors = summary.errors,
            "scan complete"
        );
        Ok(outcomes)
    }

    async fn scan_token(
        &self,
        base_token: &TokenDescriptor,
        base: Address,
        token: &TokenDescriptor,
        amount_in: U256,
    ) -> Result<ScanOutcome, EngineError> {
        let mut outcome = ScanOutcome::empty(token.clone());

        let address = match token.parsed_address() {
            Ok(address) => address,
            Err(e) => {
                warn!(token = %token.symbol, error = %e, "skipping token");
                outcome.error = Some(e);
                return Ok(outcome);
            }
        };

        let pair = match self.resolver.resolve_pair(base, address).await {
            PairQueryResult::Found(pair) => pair,
            PairQueryResult::NotFound => return Ok(outcome),
            PairQueryResult::CallFailed(e) => {
                if e.is_connectivity() {
                    self.ensure_node_reachable().await?;
                }
                outcome.error = Some(EngineError::CallFailed(e));
                return Ok(outcome);
            }
        };
        outcome.pair_exists = true;
        outcome.pair_address = Some(pair);

        match self.quoter.quote(amount_in, base_token, token).await {
            Ok(quote) => outcome.quote = Some(quote),
            Err(EngineError::Connectivity(e)) => {
                self.ensure_node_reachable().await?;
                warn!(token = %token.symbol, error = %e, "quote failed");
                outcome.error = Some(EngineError::QuoteUnavailable(e.to_string()));
            }
            Err(e) => {
                warn!(token = %token.symbol, error = %e, "quote failed");
                outcome.error = Some(e);
            }
        }

        if self.config.include_reserves {
            match self.reserves.get_ordered_reserves(pair, base, address).await {
                Ok(reserves) => {
                    outcome.reserves = Some(reserves);
                    match compute_price(&reserves, base_token.decimals, token.decimals) {
                        Ok(price) => outcome.price = Some(price),
                        Err(e) => {
                            outcome.error.get_or_insert(e);
                        }
                    }
                }
                Err(e) => {
                    let e = match e {
                        EngineError::Connectivity(cause) => {
                            self.ensure_node_reachable().await?;
                            EngineError::CallFailed(cause)
                        }
                        other => other,
                    };
                    warn!(token = %token.symbol, error = %e, "reserve read failed");
                    outcome.error.get_or_insert(e);
                }
            }
        }

        Ok(outcome)
    }

    /// After a transport failure on one token, ask the node whether it is
    /// still there. Only a failed ping aborts the scan.
    async fn ensure_node_reachable(&self) -> Result<(), EngineError> {
        self.reader.ping().await.map_err(|e| {
            error!(error = %e, "node unreachable");
            EngineError::Connectivity(e)
        })
    }
}
