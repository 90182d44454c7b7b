//! Error taxonomy for chain access and the quoting engine.
//!
//! [`ChainError`] describes what went wrong talking to the node. [`EngineError`]
//! is the per-operation error kind recorded in scan outcomes; only
//! [`EngineError::Connectivity`] is meant to abort a whole scan.

use alloy::primitives::Address;
use thiserror::Error;

/// Failure of a single read-only chain call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The node could not be reached or answered with a non-success HTTP status.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The node answered with a JSON-RPC error object (reverts land here).
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The response or its ABI payload could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The call returned no data, which happens when the target has no code.
    #[error("empty return data from {0}")]
    EmptyReturn(Address),
}

impl ChainError {
    /// Whether this failure means no chain call can be trusted right now.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ChainError::Transport(_))
    }
}

/// Error kinds produced by the quoting engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid decimals: {0} (must be between 0 and 77)")]
    InvalidDecimals(u32),
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
    #[error("no pair contract at {0}")]
    PairNotFound(Address),
    #[error("chain call failed: {0}")]
    CallFailed(ChainError),
    #[error("pair {pair} holds {token0}/{token1}, which does not match the requested tokens")]
    OrderingMismatch {
        pair: Address,
        token0: Address,
        token1: Address,
    },
    #[error("pool has an empty reserve, no price available")]
    DivisionByZero,
    #[error("quote unavailable: {0}")]
    QuoteUnavailable(String),
    #[error("arithmetic overflow while scaling amounts")]
    Overflow,
    #[error("node unreachable: {0}")]
    Connectivity(ChainError),
}

impl EngineError {
    /// Lift a chain error, keeping connectivity failures distinguishable.
    pub fn from_chain(error: ChainError) -> Self {
        if error.is_connectivity() {
            EngineError::Connectivity(error)
        } else {
            EngineError::CallFailed(error)
        }
    }

    /// Whether this error must abort a scan instead of being recorded per token.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Connectivity(_))
    }

    /// Short stable label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidDecimals(_) => "invalid_decimals",
            EngineError::InvalidAddress(_) => "invalid_address",
            EngineError::InvalidAmount(_) => "invalid_amount",
            EngineError::PairNotFound(_) => "pair_not_found",
            EngineError::CallFailed(_) => "call_failed",
            EngineError::OrderingMismatch { .. } => "ordering_mismatch",
            EngineError::DivisionByZero => "no_liquidity",
            EngineError::QuoteUnavailable(_) => "quote_unavailable",
            EngineError::Overflow => "overflow",
            EngineError::Connectivity(_) => "connectivity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_fatal() {
        let err = EngineError::from_chain(ChainError::Transport("connection refused".into()));
        assert!(err.is_fatal());
        assert_eq!(err.kind(), "connectivity");
    }

    #[test]
    fn reverts_are_recoverable() {
        let err = EngineError::from_chain(ChainError::Rpc {
            code: 3,
            message: "execution reverted".into(),
        });
        assert!(!err.is_fatal());
        assert_eq!(err.kind(), "call_failed");
    }
}
