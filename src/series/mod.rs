//! Series module - from sparse oracle events to a per-second price series
//!
//! The oracle only records price *changes*; everything between two updates
//! is, by definition, the older price. Densification samples that step
//! function at one-second resolution (zero-order hold).

pub mod store;

pub use store::SeriesStore;

use crate::types::RoundRecord;

/// Contiguous per-second price series for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSeries {
    /// Unix second of the first sample. Meaningless when `prices` is empty.
    pub start_ts: u64,
    /// One price per second, starting at `start_ts`.
    pub prices: Vec<f64>,
}

impl DenseSeries {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Expand a sparse event list into a dense series.
///
/// Each event's price is held for every second until the next event; the
/// final event contributes a single sample, so the series spans exactly
/// `last.updated_at - first.updated_at + 1` seconds. Events must be in
/// ascending `updated_at` order, which the fetcher guarantees.
///
/// Fewer than two events degenerate to a single point or an empty series.
pub fn densify(events: &[RoundRecord], decimals: u32) -> DenseSeries {
    let Some(first) = events.first() else {
        return DenseSeries {
            start_ts: 0,
            prices: Vec::new(),
        };
    };

    let last = &events[events.len() - 1];
    let span = last.updated_at.saturating_sub(first.updated_at) + 1;
    let mut prices = Vec::with_capacity(span as usize);

    for pair in events.windows(2) {
        let gap = pair[1].updated_at.saturating_sub(pair[0].updated_at);
        let price = pair[0].price(decimals);
        for _ in 0..gap {
            prices.push(price);
        }
    }
    // The last known price is not extended past the series' own end.
    prices.push(last.price(decimals));

    DenseSeries {
        start_ts: first.updated_at,
        prices,
    }
}
