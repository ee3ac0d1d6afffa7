//! Configuration management for LinkHist
//!
//! Loads from YAML files + environment variables via .env. The feed
//! registry is plain configuration handed to the pipeline, never
//! process-wide state, so alternate chains or test feeds are just a
//! different config file.

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;

use crate::history::RetryPolicy;
use crate::types::QueryWindow;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub window: WindowConfig,
    pub fetch: FetchConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL. May carry an API key, so it never appears in
    /// logs; override via LINKHIST__RPC__URL.
    pub url: String,
    /// Transport-level timeout per call in seconds. The searches tolerate
    /// failed calls but not hung ones, so this is never unlimited.
    pub timeout_secs: u64,
}

/// Query window bounds as `DD/MM/YYYY HH:MM:SS` strings, interpreted as UTC.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

const WINDOW_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

impl WindowConfig {
    pub fn to_query_window(&self) -> Result<QueryWindow> {
        Ok(QueryWindow::new(
            parse_utc(&self.start).context("invalid window.start")?,
            parse_utc(&self.end).context("invalid window.end")?,
        ))
    }
}

fn parse_utc(s: &str) -> Result<u64> {
    let dt = NaiveDateTime::parse_from_str(s, WINDOW_FORMAT)
        .with_context(|| format!("expected `{WINDOW_FORMAT}`, got `{s}`"))?;
    Ok(dt.and_utc().timestamp() as u64)
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Bounded worker pool size for the range walk. Keep modest: every
    /// worker is a live request against the RPC endpoint's rate limit.
    pub concurrency: usize,
    /// Retry policy for transient per-round failures.
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory for per-asset event files.
    pub data_dir: String,
    /// Output path for the aligned price matrix (csv.gz). Empty disables
    /// the export.
    #[serde(default)]
    pub matrix_path: String,
}

/// One oracle feed: an asset symbol, the aggregator contract address and
/// the feed's fixed-point decimal count.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub symbol: String,
    pub address: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    8
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // RPC defaults (public Arbitrum endpoint; use your own in .env)
            .set_default("rpc.url", "https://arb1.arbitrum.io/rpc")?
            .set_default("rpc.timeout_secs", 10)?
            // Window defaults
            .set_default("window.start", "10/02/2025 00:00:00")?
            .set_default("window.end", "17/02/2025 23:59:59")?
            // Fetch defaults
            .set_default("fetch.concurrency", 8)?
            .set_default("fetch.retry.attempts", 2)?
            .set_default("fetch.retry.backoff_ms", 250)?
            // Store defaults
            .set_default("store.data_dir", "data")?
            .set_default("store.matrix_path", "data/prices.csv.gz")?
            // Load config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (LINKHIST_*)
            .add_source(Environment::with_prefix("LINKHIST").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        let symbols: Vec<&str> = self.feeds.iter().map(|f| f.symbol.as_str()).collect();
        format!(
            "feeds={:?} window=[{} .. {}] concurrency={} retries={} data_dir={}",
            symbols,
            self.window.start,
            self.window.end,
            self.fetch.concurrency,
            self.fetch.retry.attempts,
            self.store.data_dir
        )
    }

    fn validate(&self) -> Result<()> {
        if self.feeds.is_empty() {
            bail!("no feeds configured; add a feeds list to config/default.yaml");
        }

        let mut seen = HashSet::new();
        for feed in &self.feeds {
            if !seen.insert(feed.symbol.as_str()) {
                bail!("duplicate feed symbol `{}`", feed.symbol);
            }
            if !feed.address.starts_with("0x") || feed.address.len() != 42 {
                bail!(
                    "feed `{}` has a malformed contract address `{}`",
                    feed.symbol,
                    feed.address
                );
            }
        }

        // Parse eagerly so a bad date string fails at startup, not after
        // the first feed has already been fetched.
        self.window.to_query_window()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_dates_as_utc() {
        let window = WindowConfig {
            start: "10/02/2025 00:00:00".to_string(),
            end: "17/02/2025 23:59:59".to_string(),
        };
        let w = window.to_query_window().unwrap();
        assert_eq!(w.ts_start, 1739145600);
        assert_eq!(w.ts_end, 1739836799);
    }

    #[test]
    fn rejects_malformed_dates() {
        let window = WindowConfig {
            start: "2025-02-10".to_string(),
            end: "17/02/2025 23:59:59".to_string(),
        };
        assert!(window.to_query_window().is_err());
    }

    fn base_config() -> AppConfig {
        AppConfig {
            rpc: RpcConfig {
                url: "https://arb1.arbitrum.io/rpc".to_string(),
                timeout_secs: 10,
            },
            window: WindowConfig {
                start: "10/02/2025 00:00:00".to_string(),
                end: "17/02/2025 23:59:59".to_string(),
            },
            fetch: FetchConfig {
                concurrency: 8,
                retry: RetryPolicy::default(),
            },
            store: StoreConfig {
                data_dir: "data".to_string(),
                matrix_path: String::new(),
            },
            feeds: vec![FeedConfig {
                symbol: "btc".to_string(),
                address: "0x6ce185860a4963106506C203335A2910413708e9".to_string(),
                decimals: 8,
            }],
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_empty_feed_list() {
        let mut cfg = base_config();
        cfg.feeds.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let mut cfg = base_config();
        let dup = cfg.feeds[0].clone();
        cfg.feeds.push(dup);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_malformed_address() {
        let mut cfg = base_config();
        cfg.feeds[0].address = "6ce185860a4963106506C203335A2910413708e9".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn digest_omits_rpc_url() {
        let cfg = base_config();
        assert!(!cfg.digest().contains("arb1.arbitrum.io"));
    }
}
