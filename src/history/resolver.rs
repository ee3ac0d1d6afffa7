//! Timestamp-bound resolver
//!
//! Pins a target timestamp to a round id: the first round updated at or
//! after the window start, or the last round updated at or before the
//! window end.

use tracing::debug;

use super::{lookup_with_retry, FeedError, RetryPolicy};
use crate::oracle::RoundOracle;
use crate::types::RoundLookup;

/// Which side of the window a bound resolution serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest round id with `updated_at >= target`.
    Start,
    /// Largest round id with `updated_at <= target`.
    End,
}

/// Binary-search `[epoch_start, latest.round_id]` for the round id whose
/// `updated_at` is the tight bound on `target`.
///
/// Failed lookups skip the search forward past the unreliable id;
/// uninitialized rounds pull the upper bound down. Both moves make strict
/// progress, so the search terminates even when every probe fails.
///
/// Returns `Ok(None)` when no round in range satisfies the predicate — an
/// empty query result, not a broken feed.
pub async fn resolve_bound(
    oracle: &dyn RoundOracle,
    target: u64,
    direction: Direction,
    epoch_start: u128,
    retry: RetryPolicy,
) -> Result<Option<u128>, FeedError> {
    let latest = oracle.latest_round().await?;
    let mut lower = epoch_start;
    let mut upper = latest.round_id;
    let mut candidate = None;

    while lower <= upper {
        let mid = lower + (upper - lower) / 2;
        let record = match lookup_with_retry(oracle, mid, retry).await {
            RoundLookup::Valid(record) => record,
            RoundLookup::TransportError => {
                debug!(from = lower, to = mid + 1, "skipping past unreliable id");
                lower = mid + 1;
                continue;
            }
            RoundLookup::Uninitialized => {
                if mid == 0 {
                    break;
                }
                upper = mid - 1;
                continue;
            }
        };

        match direction {
            Direction::Start => {
                if record.updated_at >= target {
                    candidate = Some(mid);
                    if mid == 0 {
                        break;
                    }
                    upper = mid - 1;
                } else {
                    lower = mid + 1;
                }
            }
            Direction::End => {
                if record.updated_at <= target {
                    candidate = Some(mid);
                    lower = mid + 1;
                } else {
                    if mid == 0 {
                        break;
                    }
                    upper = mid - 1;
                }
            }
        }
    }

    Ok(candidate)
}
