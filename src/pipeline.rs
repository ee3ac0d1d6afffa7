//! Per-asset retrieval pipeline and the multi-asset run loop
//!
//! Locator → resolver (both bounds) → fetcher → store, once per configured
//! feed. Assets share nothing but the HTTP client, so a failure in one
//! never aborts the rest of the run.

use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::dataset;
use crate::history::{fetch_range, find_epoch_start, resolve_bound, Direction, FeedError, RetryPolicy};
use crate::oracle::{JsonRpcOracle, RoundOracle};
use crate::series::SeriesStore;
use crate::types::{QueryWindow, RoundRecord};

/// Retrieve one feed's sparse event list for the window.
///
/// Distinguishes the two "nothing came back" cases the same way callers
/// must: a feed with no valid rounds at all is `Err(NoValidRounds)`, while
/// a window no round falls into is `Ok(vec![])`.
pub async fn fetch_feed_history(
    oracle: &dyn RoundOracle,
    window: QueryWindow,
    concurrency: usize,
    retry: RetryPolicy,
) -> Result<Vec<RoundRecord>, FeedError> {
    let Some(epoch_start) = find_epoch_start(oracle, retry).await? else {
        return Err(FeedError::NoValidRounds);
    };
    info!(epoch_start, "located first valid round");

    let start = resolve_bound(oracle, window.ts_start, Direction::Start, epoch_start, retry).await?;
    let end = resolve_bound(oracle, window.ts_end, Direction::End, epoch_start, retry).await?;

    let (Some(start_id), Some(end_id)) = (start, end) else {
        info!(window = %window, "no rounds satisfy the window bounds");
        return Ok(Vec::new());
    };

    info!(start_id, end_id, "resolved round range");
    Ok(fetch_range(oracle, start_id, end_id, window, concurrency, retry).await)
}

/// Fetch and persist every configured feed, then export the aligned matrix
/// if one is configured.
pub async fn run(config: &AppConfig) -> Result<()> {
    let window = config.window.to_query_window()?;
    let client = Client::builder()
        .timeout(Duration::from_secs(config.rpc.timeout_secs))
        .build()
        .context("building http client")?;
    let store = SeriesStore::new(&config.store.data_dir);

    for feed in &config.feeds {
        info!(asset = %feed.symbol, window = %window, "fetching feed history");
        let oracle = JsonRpcOracle::new(client.clone(), config.rpc.url.clone(), feed.address.clone());

        match fetch_feed_history(&oracle, window, config.fetch.concurrency, config.fetch.retry).await
        {
            Ok(events) => {
                info!(asset = %feed.symbol, events = events.len(), "retrieval complete");
                if let Err(e) = store.save(&feed.symbol, &events) {
                    warn!(asset = %feed.symbol, error = %e, "failed to persist events");
                }
            }
            Err(e) => {
                warn!(asset = %feed.symbol, error = %e, "feed retrieval failed, continuing");
            }
        }
    }

    if !config.store.matrix_path.is_empty() {
        dataset::write_price_matrix(&store, &config.feeds, Path::new(&config.store.matrix_path))?;
    }

    Ok(())
}
