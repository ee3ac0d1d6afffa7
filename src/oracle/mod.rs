//! Oracle module - read-only access to a Chainlink aggregator feed
//!
//! Wraps the two query primitives the aggregator exposes: "latest round"
//! and "round by id". Nothing else exists upstream — no range query, no
//! timestamp query — which is why the history module has to binary-search
//! the round-id space.

mod rpc;

pub use rpc::JsonRpcOracle;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{RoundLookup, RoundRecord};

/// Errors surfaced when the feed cannot be queried at all.
///
/// Per-round failures never reach callers as errors; they collapse into
/// [`RoundLookup::TransportError`] and the searches route around them.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("rpc transport failure: {0}")]
    Transport(String),
    #[error("rpc returned an error: {0}")]
    Rpc(String),
    #[error("malformed round data: {0}")]
    Decode(String),
}

/// A single price feed's query surface.
///
/// No retries at this layer; retry/backoff policy belongs to the search
/// layers, where a failed id can simply be treated as invalid.
#[async_trait]
pub trait RoundOracle: Send + Sync {
    /// Fetch the most recent round. A failure here means the feed cannot
    /// even be bounded, so it is a hard error rather than a lookup state.
    async fn latest_round(&self) -> Result<RoundRecord, OracleError>;

    /// Fetch one round by id. Reverts, timeouts and malformed responses all
    /// become [`RoundLookup::TransportError`]; a successful call with
    /// `updated_at == 0` becomes [`RoundLookup::Uninitialized`].
    async fn round_by_id(&self, round_id: u128) -> RoundLookup;
}
