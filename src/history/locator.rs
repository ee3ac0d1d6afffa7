//! Epoch-start locator
//!
//! Finds the smallest round id with valid update data, given only the two
//! point queries the aggregator exposes.

use tracing::debug;

use super::{lookup_with_retry, FeedError, RetryPolicy};
use crate::oracle::RoundOracle;
use crate::types::RoundLookup;

/// Binary-search `[1, latest.round_id]` for the feed's epoch start.
///
/// The predicate "round is valid" is assumed monotonic in the round id:
/// once a feed starts reporting, every later id is initialized. Chainlink
/// aggregators behave this way today, but nothing in the query surface can
/// verify it — if a feed ever retired and reused low ids, the search could
/// converge on the wrong round.
///
/// Returns `Ok(None)` when the converged id fails re-validation, i.e. the
/// feed holds no valid rounds at all.
pub async fn find_epoch_start(
    oracle: &dyn RoundOracle,
    retry: RetryPolicy,
) -> Result<Option<u128>, FeedError> {
    let latest = oracle.latest_round().await?;
    let mut lower = 1u128;
    let mut upper = latest.round_id;

    while lower < upper {
        let mid = lower + (upper - lower) / 2;
        match lookup_with_retry(oracle, mid, retry).await {
            RoundLookup::Valid(_) => {
                // Valid round found, keep searching below it.
                upper = mid;
            }
            RoundLookup::Uninitialized | RoundLookup::TransportError => {
                debug!(from = lower, to = mid + 1, "raising lower bound");
                lower = mid + 1;
            }
        }
    }

    // The converged id may itself be invalid (every probe on the way down
    // could have failed), so it gets one final validation.
    match lookup_with_retry(oracle, lower, retry).await {
        RoundLookup::Valid(_) => Ok(Some(lower)),
        _ => Ok(None),
    }
}
