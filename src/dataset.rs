//! Aligned price matrix export
//!
//! Builds the table the portfolio optimizer consumes: one `ts` column in
//! unix seconds, one row per second, one price column per asset. All
//! series are truncated to the shortest available length so every row is
//! fully populated.

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::series::{DenseSeries, SeriesStore};

/// Load every persisted feed, densify, align and write `path` as a
/// gzip-compressed CSV. Feeds with no stored events are skipped with a
/// warning; at least one non-empty series is required.
pub fn write_price_matrix(store: &SeriesStore, feeds: &[FeedConfig], path: &Path) -> Result<()> {
    let mut columns: Vec<(String, DenseSeries)> = Vec::new();
    for feed in feeds {
        let series = match store.load_dense(&feed.symbol, feed.decimals) {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => {
                warn!(asset = %feed.symbol, "no events stored, excluding from matrix");
                continue;
            }
            Err(e) => {
                warn!(asset = %feed.symbol, error = %e, "failed to load series, excluding from matrix");
                continue;
            }
        };
        columns.push((feed.symbol.clone(), series));
    }

    if columns.is_empty() {
        bail!("no feeds have stored data; nothing to export");
    }

    // Truncate to the shortest series; the ts column counts up from the
    // first column's start second.
    let rows = columns.iter().map(|(_, s)| s.len()).min().unwrap_or(0);
    let base_ts = columns[0].1.start_ts;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output dir {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating matrix file {}", path.display()))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut writer = csv::Writer::from_writer(encoder);

    let mut header = vec!["ts".to_string()];
    header.extend(columns.iter().map(|(symbol, _)| symbol.clone()));
    writer.write_record(&header)?;

    for i in 0..rows {
        let mut record = vec![(base_ts + i as u64).to_string()];
        for (_, series) in &columns {
            record.push(series.prices[i].to_string());
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing matrix csv: {e}"))?
        .finish()
        .context("flushing matrix gzip stream")?
        .flush()
        .context("flushing matrix file")?;

    info!(
        path = %path.display(),
        rows,
        assets = columns.len(),
        "wrote aligned price matrix"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoundRecord;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::path::PathBuf;

    fn temp_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("linkhist_dataset_{}_{}", test_name, uuid::Uuid::new_v4()))
    }

    fn event(round_id: u128, ts: u64, answer: i128) -> RoundRecord {
        RoundRecord {
            round_id,
            answer,
            started_at: ts,
            updated_at: ts,
            answered_in_round: round_id,
        }
    }

    fn feed(symbol: &str) -> FeedConfig {
        FeedConfig {
            symbol: symbol.to_string(),
            address: "0x6ce185860a4963106506C203335A2910413708e9".to_string(),
            decimals: 8,
        }
    }

    fn read_matrix(path: &Path) -> String {
        let mut out = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn truncates_to_shortest_series() {
        let dir = temp_dir("truncate");
        let store = SeriesStore::new(&dir);
        // btc spans 5 seconds, eth spans 3.
        store
            .save("btc", &[event(1, 100, 1_00000000), event(2, 104, 2_00000000)])
            .unwrap();
        store
            .save("eth", &[event(1, 100, 3_00000000), event(2, 102, 4_00000000)])
            .unwrap();

        let path = dir.join("prices.csv.gz");
        write_price_matrix(&store, &[feed("btc"), feed("eth")], &path).unwrap();

        let body = read_matrix(&path);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "ts,btc,eth");
        assert_eq!(lines.len(), 1 + 3);
        assert_eq!(lines[1], "100,1,3");
        assert_eq!(lines[2], "101,1,3");
        assert_eq!(lines[3], "102,1,4");
    }

    #[test]
    fn skips_feeds_without_data() {
        let dir = temp_dir("skip_empty");
        let store = SeriesStore::new(&dir);
        store
            .save("btc", &[event(1, 100, 1_00000000)])
            .unwrap();
        store.save("eth", &[]).unwrap();

        let path = dir.join("prices.csv.gz");
        write_price_matrix(&store, &[feed("btc"), feed("eth"), feed("sol")], &path).unwrap();

        let body = read_matrix(&path);
        assert_eq!(body.lines().next().unwrap(), "ts,btc");
    }

    #[test]
    fn fails_when_nothing_is_stored() {
        let dir = temp_dir("all_empty");
        let store = SeriesStore::new(&dir);
        let path = dir.join("prices.csv.gz");
        assert!(write_price_matrix(&store, &[feed("btc")], &path).is_err());
    }
}
