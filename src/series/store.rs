//! Compressed persistence for sparse event lists
//!
//! The expensive part of this system is the binary-search retrieval, so the
//! store persists the raw sparse events and rebuilds the dense series on
//! load. One gzip JSON file per asset symbol; distinct keys mean parallel
//! asset pipelines never contend on a file.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing::info;

use super::{densify, DenseSeries};
use crate::types::RoundRecord;

/// File-per-asset store rooted at a data directory.
pub struct SeriesStore {
    data_dir: PathBuf,
}

impl SeriesStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Content path for one asset's event list.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{symbol}.json.gz"))
    }

    /// Persist one asset's sparse event list, replacing any previous file.
    pub fn save(&self, symbol: &str, events: &[RoundRecord]) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("creating data dir {}", self.data_dir.display()))?;

        let path = self.path_for(symbol);
        let file = File::create(&path)
            .with_context(|| format!("creating event file {}", path.display()))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, events)
            .with_context(|| format!("serializing events for {symbol}"))?;
        encoder
            .finish()
            .with_context(|| format!("flushing event file {}", path.display()))?;

        info!(asset = %symbol, events = events.len(), path = %path.display(), "saved event list");
        Ok(path)
    }

    /// Load one asset's sparse event list.
    pub fn load(&self, symbol: &str) -> Result<Vec<RoundRecord>> {
        let path = self.path_for(symbol);
        let file = File::open(&path)
            .with_context(|| format!("opening event file {}", path.display()))?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let events: Vec<RoundRecord> = serde_json::from_reader(decoder)
            .with_context(|| format!("deserializing events for {symbol}"))?;
        Ok(events)
    }

    /// Load and densify in one step. Reconstruction is cheap and repeatable;
    /// only the retrieval needed to run once.
    pub fn load_dense(&self, symbol: &str, decimals: u32) -> Result<DenseSeries> {
        let events = self.load(symbol)?;
        Ok(densify(&events, decimals))
    }
}
