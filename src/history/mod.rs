//! History module - reconstructing a feed's past from two query primitives
//!
//! The aggregator only answers "latest round" and "round by id", so every
//! historical question becomes a binary search over the round-id space:
//! the locator finds the feed's epoch start, the resolver pins a timestamp
//! to a round id, and the fetcher walks the resolved range.

mod fetcher;
mod locator;
mod resolver;

pub use fetcher::fetch_range;
pub use locator::find_epoch_start;
pub use resolver::{resolve_bound, Direction};

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::oracle::{OracleError, RoundOracle};
use crate::types::RoundLookup;

/// Feed-level failures. Per-round problems never surface here; the searches
/// absorb them by narrowing their bounds.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The locator could not converge to any valid round. Distinct from an
    /// empty query result: this means the feed itself holds no data.
    #[error("feed has no valid rounds")]
    NoValidRounds,
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Bounded retry for transient lookup failures.
///
/// Applies to [`RoundLookup::TransportError`] only; an uninitialized round
/// is a definitive answer and is returned immediately.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first lookup.
    pub attempts: u32,
    /// Delay before each retry, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff_ms: 250,
        }
    }
}

/// Look up one round, retrying transport errors per the policy. After the
/// retry budget is spent the caller treats the id as invalid and moves on.
pub(crate) async fn lookup_with_retry(
    oracle: &dyn RoundOracle,
    round_id: u128,
    retry: RetryPolicy,
) -> RoundLookup {
    let mut lookup = oracle.round_by_id(round_id).await;
    for attempt in 0..retry.attempts {
        if lookup != RoundLookup::TransportError {
            break;
        }
        tracing::debug!(round_id, attempt = attempt + 1, "retrying round lookup");
        tokio::time::sleep(Duration::from_millis(retry.backoff_ms)).await;
        lookup = oracle.round_by_id(round_id).await;
    }
    lookup
}

#[cfg(test)]
pub(crate) mod testutil {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::oracle::{OracleError, RoundOracle};
    use crate::types::{RoundLookup, RoundRecord};

    /// Scripted oracle: a fixed latest round plus per-id lookup outcomes.
    /// Ids without a script entry behave like nonexistent rounds, which the
    /// real transport reports as reverts. `latest_round` only serves as the
    /// search upper bound, so it answers independently of the script.
    pub struct FakeOracle {
        latest: RoundRecord,
        rounds: HashMap<u128, RoundLookup>,
        pub calls: AtomicUsize,
    }

    impl FakeOracle {
        pub fn new(latest_id: u128) -> Self {
            Self {
                latest: RoundRecord {
                    round_id: latest_id,
                    answer: 100_000_000,
                    started_at: 0,
                    updated_at: 0,
                    answered_in_round: latest_id,
                },
                rounds: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        /// Valid round with `updated_at = ts` and a default answer.
        pub fn with_round(self, id: u128, ts: u64) -> Self {
            self.with_answer(id, ts, 100_000_000)
        }

        pub fn with_answer(mut self, id: u128, ts: u64, answer: i128) -> Self {
            let record = RoundRecord {
                round_id: id,
                answer,
                started_at: ts,
                updated_at: ts,
                answered_in_round: id,
            };
            if id == self.latest.round_id {
                self.latest = record.clone();
            }
            self.rounds.insert(id, RoundLookup::Valid(record));
            self
        }

        pub fn with_uninitialized(mut self, id: u128) -> Self {
            self.rounds.insert(id, RoundLookup::Uninitialized);
            self
        }

        pub fn with_failure(mut self, id: u128) -> Self {
            self.rounds.insert(id, RoundLookup::TransportError);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl RoundOracle for FakeOracle {
        async fn latest_round(&self) -> Result<RoundRecord, OracleError> {
            Ok(self.latest.clone())
        }

        async fn round_by_id(&self, round_id: u128) -> RoundLookup {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.rounds
                .get(&round_id)
                .cloned()
                .unwrap_or(RoundLookup::TransportError)
        }
    }

    /// No retries, no backoff; keeps search tests fast and deterministic.
    pub fn no_retry() -> super::RetryPolicy {
        super::RetryPolicy {
            attempts: 0,
            backoff_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{no_retry, FakeOracle};
    use super::*;

    #[tokio::test]
    async fn retry_is_bounded_for_transport_errors() {
        let oracle = FakeOracle::new(10).with_failure(5);
        let retry = RetryPolicy {
            attempts: 3,
            backoff_ms: 0,
        };
        let lookup = lookup_with_retry(&oracle, 5, retry).await;
        assert_eq!(lookup, RoundLookup::TransportError);
        assert_eq!(oracle.call_count(), 4);
    }

    #[tokio::test]
    async fn uninitialized_rounds_are_not_retried() {
        let oracle = FakeOracle::new(10).with_uninitialized(5);
        let retry = RetryPolicy {
            attempts: 3,
            backoff_ms: 0,
        };
        let lookup = lookup_with_retry(&oracle, 5, retry).await;
        assert_eq!(lookup, RoundLookup::Uninitialized);
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn zero_retry_policy_does_a_single_lookup() {
        let oracle = FakeOracle::new(10).with_failure(7);
        let lookup = lookup_with_retry(&oracle, 7, no_retry()).await;
        assert_eq!(lookup, RoundLookup::TransportError);
        assert_eq!(oracle.call_count(), 1);
    }
}
