//! LinkHist Library
//!
//! Reconstructs dense per-second price history from a sparse Chainlink
//! oracle feed: binary-search retrieval over the round-id space, zero-order
//! hold densification, compressed per-asset persistence and an aligned
//! matrix export for downstream analysis.

pub mod config;
pub mod dataset;
pub mod history;
pub mod oracle;
pub mod pipeline;
pub mod series;
pub mod types;
