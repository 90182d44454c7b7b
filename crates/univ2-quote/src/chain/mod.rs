//! Read-only access to contract state.
//!
//! [`ChainReader`] is the single seam between the engine and the node. The
//! production implementation, [`RpcChainReader`], speaks JSON-RPC over a
//! `reqwest::Client` owned by the caller; [`MockChain`] serves tests.

use alloy::hex;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ChainError;

pub mod mock;

pub use mock::{MockChain, MockPool, RecordedCall};

/// Executes read-only calls against the chain.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` of `input` against `to` at the latest block; returns raw return data.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError>;

    /// Native coin balance of `owner` in wei.
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    /// Cheap liveness check, used to tell a dead node from one failed call.
    async fn ping(&self) -> Result<(), ChainError>;
}

/// ABI-encode `call`, execute it against `to` and decode the typed return.
///
/// Empty return data means `to` has no code and is reported as
/// [`ChainError::EmptyReturn`] rather than as a decode failure.
pub async fn call_contract<C: SolCall>(
    reader: &dyn ChainReader,
    to: Address,
    call: &C,
) -> Result<C::Return, ChainError> {
    let input = Bytes::from(call.abi_encode());
    let output = reader.call(to, input).await?;

    if output.is_empty() {
        return Err(ChainError::EmptyReturn(to));
    }

    C::abi_decode_returns(&output, true)
        .map_err(|e| ChainError::Malformed(format!("{} returned undecodable data: {e}", C::SIGNATURE)))
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC backed [`ChainReader`].
///
/// Holds no state besides the injected HTTP client, so a single instance can
/// serve concurrent calls.
#[derive(Debug, Clone)]
pub struct RpcChainReader {
    client: Client,
    rpc_url: String,
}

impl RpcChainReader {
    /// Creates a reader and tests RPC connectivity via `eth_blockNumber`.
    ///
    /// # Errors
    /// Returns [`ChainError::Transport`] if the URL is malformed or the node
    /// cannot be reached.
    #[tracing::instrument(skip_all, fields(rpc_url = %rpc_url))]
    pub async fn connect(client: Client, rpc_url: &str) -> Result<Self, ChainError> {
        reqwest::Url::parse(rpc_url)
            .map_err(|e| ChainError::Transport(format!("invalid RPC URL {rpc_url:?}: {e}")))?;

        let reader = Self {
            client,
            rpc_url: rpc_url.to_string(),
        };

        let latest_block = reader.block_number().await?;
        tracing::info!(rpc_url = %rpc_url, latest_block, "RPC connection successful");

        Ok(reader)
    }

    /// Latest block number known to the node.
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let result = self
            .rpc_hex_result("eth_blockNumber", serde_json::json!([]))
            .await?;
        let number = parse_quantity(&result)?;
        u64::try_from(number)
            .map_err(|_| ChainError::Malformed(format!("block number {number} out of range")))
    }

    /// Make a JSON-RPC call and extract the hex result string.
    async fn rpc_hex_result(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<String, ChainError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("{method} request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChainError::Transport(format!("failed to read {method} response: {e}")))?;

        // Some providers pair error objects with non-2xx statuses; the error object wins.
        let rpc: RpcResponse<String> = match serde_json::from_str(&body) {
            Ok(rpc) => rpc,
            Err(e) if status.is_success() => {
                return Err(ChainError::Malformed(format!(
                    "failed to decode {method} response: {e}"
                )))
            }
            Err(_) => {
                return Err(ChainError::Transport(format!(
                    "{method} HTTP status: {status}"
                )))
            }
        };

        if let Some(error) = rpc.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        if !status.is_success() {
            return Err(ChainError::Transport(format!("{method} HTTP status: {status}")));
        }

        rpc.result
            .ok_or_else(|| ChainError::Malformed(format!("{method} missing result")))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    #[tracing::instrument(level = "debug", skip_all, fields(to = %to))]
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError> {
        let params = serde_json::json!([
            {
                "to": to.to_checksum(None),
                "data": format!("0x{}", hex::encode(&input)),
            },
            "latest"
        ]);

        let result = self.rpc_hex_result("eth_call", params).await?;
        let data = hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| ChainError::Malformed(format!("eth_call returned invalid hex: {e}")))?;

        tracing::debug!(to = %to, bytes = data.len(), "eth_call returned");
        Ok(Bytes::from(data))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(owner = %owner))]
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        let params = serde_json::json!([owner.to_checksum(None), "latest"]);
        let result = self.rpc_hex_result("eth_getBalance", params).await?;
        parse_quantity(&result)
    }

    async fn ping(&self) -> Result<(), ChainError> {
        self.block_number().await.map(|_| ())
    }
}

/// Parse a JSON-RPC hex quantity (`"0x1a"`).
fn parse_quantity(value: &str) -> Result<U256, ChainError> {
    let digits = value.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ChainError::Malformed(format!("invalid quantity {value:?}: {e}")))
}
