//! JSON-RPC transport for Chainlink aggregator reads
//!
//! Issues raw `eth_call` requests against the aggregator contract and
//! decodes the five 32-byte return words by hand. Both query primitives
//! return the same tuple:
//! `(roundId uint80, answer int256, startedAt uint256, updatedAt uint256, answeredInRound uint80)`

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{OracleError, RoundOracle};
use crate::types::{RoundLookup, RoundRecord};

/// `latestRoundData()` selector.
const SEL_LATEST_ROUND_DATA: &str = "0xfeaf968c";
/// `getRoundData(uint80)` selector.
const SEL_GET_ROUND_DATA: &str = "0x9a6fc8f5";

/// Five 32-byte words.
const ROUND_TUPLE_LEN: usize = 160;

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
}

/// Oracle client for one aggregator contract over an HTTP JSON-RPC endpoint.
///
/// Each call is a single network round-trip; the reqwest client's timeout is
/// the only thing standing between a hung endpoint and a stuck pipeline, so
/// it is always set (see `RpcConfig`).
pub struct JsonRpcOracle {
    client: Client,
    rpc_url: String,
    feed_address: String,
}

impl JsonRpcOracle {
    pub fn new(client: Client, rpc_url: impl Into<String>, feed_address: impl Into<String>) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
            feed_address: feed_address.into(),
        }
    }

    async fn eth_call(&self, call_data: &str) -> Result<Vec<u8>, OracleError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{
                "to": self.feed_address,
                "data": call_data
            }, "latest"],
            "id": 1
        });

        let response: JsonRpcResponse = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        if let Some(err) = response.error {
            // Queries for rounds the aggregator never ran revert with
            // "No data present"; that lands here like any other RPC error.
            return Err(OracleError::Rpc(err.to_string()));
        }

        let result = response
            .result
            .ok_or_else(|| OracleError::Decode("no result in rpc response".into()))?;

        hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| OracleError::Decode(format!("invalid hex: {e}")))
    }

    async fn fetch_round(&self, call_data: &str) -> Result<RoundRecord, OracleError> {
        let bytes = self.eth_call(call_data).await?;
        decode_round_tuple(&bytes)
    }
}

#[async_trait]
impl RoundOracle for JsonRpcOracle {
    async fn latest_round(&self) -> Result<RoundRecord, OracleError> {
        self.fetch_round(SEL_LATEST_ROUND_DATA).await
    }

    async fn round_by_id(&self, round_id: u128) -> RoundLookup {
        let call_data = encode_get_round_data(round_id);
        match self.fetch_round(&call_data).await {
            Ok(record) if record.is_initialized() => RoundLookup::Valid(record),
            Ok(_) => RoundLookup::Uninitialized,
            Err(e) => {
                debug!(feed = %self.feed_address, round_id, error = %e, "round lookup failed");
                RoundLookup::TransportError
            }
        }
    }
}

/// ABI-encode a `getRoundData(uint80)` call.
fn encode_get_round_data(round_id: u128) -> String {
    format!("{}{:064x}", SEL_GET_ROUND_DATA, round_id)
}

/// Decode the five-word round tuple returned by both query primitives.
fn decode_round_tuple(bytes: &[u8]) -> Result<RoundRecord, OracleError> {
    if bytes.len() < ROUND_TUPLE_LEN {
        return Err(OracleError::Decode(format!(
            "round tuple too short: {} bytes",
            bytes.len()
        )));
    }

    Ok(RoundRecord {
        round_id: u128_word(bytes, 0)?,
        answer: i128_word(bytes, 1)?,
        started_at: u64_word(bytes, 2)?,
        updated_at: u64_word(bytes, 3)?,
        answered_in_round: u128_word(bytes, 4)?,
    })
}

/// Low 16 bytes of the nth 32-byte word. Enough for uint80 round ids.
fn u128_word(bytes: &[u8], n: usize) -> Result<u128, OracleError> {
    let start = n * 32 + 16;
    let arr: [u8; 16] = bytes[start..start + 16]
        .try_into()
        .map_err(|_| OracleError::Decode(format!("word {n} out of range")))?;
    Ok(u128::from_be_bytes(arr))
}

/// Low 16 bytes of the nth word, as a signed value. Feed answers are far
/// below the i128 range in practice.
fn i128_word(bytes: &[u8], n: usize) -> Result<i128, OracleError> {
    let start = n * 32 + 16;
    let arr: [u8; 16] = bytes[start..start + 16]
        .try_into()
        .map_err(|_| OracleError::Decode(format!("word {n} out of range")))?;
    Ok(i128::from_be_bytes(arr))
}

/// Low 8 bytes of the nth word. Unix-second timestamps fit comfortably.
fn u64_word(bytes: &[u8], n: usize) -> Result<u64, OracleError> {
    let start = n * 32 + 24;
    let arr: [u8; 8] = bytes[start..start + 8]
        .try_into()
        .map_err(|_| OracleError::Decode(format!("word {n} out of range")))?;
    Ok(u64::from_be_bytes(arr))
}
