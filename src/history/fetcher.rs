//! Range fetcher
//!
//! Walks every round id between the resolved bounds and keeps the records
//! whose update time actually falls inside the requested window.

use futures_util::{stream, StreamExt};
use tracing::debug;

use super::{lookup_with_retry, RetryPolicy};
use crate::oracle::RoundOracle;
use crate::types::{QueryWindow, RoundLookup, RoundRecord};

/// Fetch `[start_id, end_id]` inclusive and return the sparse event list in
/// ascending round-id order.
///
/// The per-round calls are independent, so they fan out with a bounded
/// worker pool; `buffered` keeps completion order aligned with id order.
/// The resolver's bounds are approximate at the edges, so each record's
/// `updated_at` is re-checked against the window. Rounds that stay
/// unavailable after retries are skipped — the densifier's forward fill
/// absorbs the gap.
pub async fn fetch_range(
    oracle: &dyn RoundOracle,
    start_id: u128,
    end_id: u128,
    window: QueryWindow,
    concurrency: usize,
    retry: RetryPolicy,
) -> Vec<RoundRecord> {
    if end_id < start_id {
        return Vec::new();
    }

    let lookups: Vec<RoundLookup> = stream::iter(start_id..=end_id)
        .map(|id| lookup_with_retry(oracle, id, retry))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut events = Vec::new();
    for lookup in lookups {
        match lookup {
            RoundLookup::Valid(record) if window.contains(record.updated_at) => {
                events.push(record);
            }
            RoundLookup::Valid(record) => {
                debug!(
                    round_id = record.round_id,
                    updated_at = record.updated_at,
                    "round outside window, dropping"
                );
            }
            RoundLookup::Uninitialized | RoundLookup::TransportError => {}
        }
    }
    events
}
