//! LinkHist binary
//!
//! Loads the feed registry and window from configuration, retrieves every
//! feed's history and writes the per-asset event files plus the aligned
//! price matrix.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkhist::config::AppConfig;
use linkhist::pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linkhist=info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!(config = %config.digest(), "starting linkhist");

    pipeline::run(&config).await
}
