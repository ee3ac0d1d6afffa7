//! Core types used throughout LinkHist
//!
//! Defines the oracle round record, the tri-state lookup result and the
//! caller-supplied query window.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrete oracle update, as returned by `latestRoundData()` /
/// `getRoundData(uint80)`.
///
/// `round_id` is strictly increasing with real-world time but the id space
/// below the feed's epoch start is not densely populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round identifier (uint80 on chain; phase id in the high bits).
    pub round_id: u128,
    /// Fixed-point price, scaled by the feed's decimal count.
    pub answer: i128,
    /// Unix seconds when the round was started.
    pub started_at: u64,
    /// Unix seconds when the round was last updated. Zero marks an
    /// uninitialized round, never a valid data point.
    pub updated_at: u64,
    /// Round in which the answer was computed.
    pub answered_in_round: u128,
}

impl RoundRecord {
    /// A round with `updated_at == 0` exists on chain but carries no data.
    pub fn is_initialized(&self) -> bool {
        self.updated_at != 0
    }

    /// Convert the fixed-point answer to a floating price.
    pub fn price(&self, decimals: u32) -> f64 {
        self.answer as f64 / 10f64.powi(decimals as i32)
    }
}

/// Outcome of a single `getRoundData` lookup.
///
/// Uninitialized rounds and transport failures are kept apart so a retry
/// policy can target transient failures without touching the search logic
/// for rounds that genuinely hold no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundLookup {
    /// The round exists and carries a usable update.
    Valid(RoundRecord),
    /// The call succeeded but `updated_at == 0`.
    Uninitialized,
    /// The RPC call failed (revert, timeout, malformed response, ...).
    TransportError,
}

impl RoundLookup {
    pub fn is_valid(&self) -> bool {
        matches!(self, RoundLookup::Valid(_))
    }
}

/// Inclusive unix-second window supplied by the caller.
///
/// An inverted window (`ts_end < ts_start`) is legal and simply matches
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub ts_start: u64,
    pub ts_end: u64,
}

impl QueryWindow {
    pub fn new(ts_start: u64, ts_end: u64) -> Self {
        Self { ts_start, ts_end }
    }

    pub fn contains(&self, ts: u64) -> bool {
        self.ts_start <= ts && ts <= self.ts_end
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.ts_start, self.ts_end)
    }
}
