//! # safe-fetch
//!
//! Fetch many remote records in one batch without letting a single failure
//! abort the rest.
//!
//! Each identifier (a URL or a resource key) is handed to a [`Fetcher`]. A
//! record becomes a success, an error becomes a failure entry that keeps the
//! identifier and an [`ErrorDetail`]. The caller gets a [`BatchOutcome`] with
//! exactly one result per identifier, in input order, and decides whether to
//! retry, ignore, or report the gaps.
//!
//! ## Quick Start
//!
//! ```no_run
//! use safe_fetch::{BatchFetcher, Config, FailureManifest, HttpJsonFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.fetch.base_url = Some("https://www.dnd5eapi.co/api/monsters".to_string());
//!     config.fetch.concurrency = 4;
//!
//!     let fetcher: HttpJsonFetcher<serde_json::Value> = HttpJsonFetcher::new(&config.fetch)?;
//!     let batch = BatchFetcher::new(config)?;
//!
//!     let outcome = batch.fetch_all(["aboleth", "goblin", "no-such-monster"], &fetcher).await;
//!
//!     for monster in outcome.successes() {
//!         println!("{}", monster["name"]);
//!     }
//!     FailureManifest::from_outcome(&outcome)
//!         .write_to("failures.json")
//!         .await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Batch fetcher and the per-identifier fetch contract
pub mod fetcher;
/// HTTP+JSON fetcher
pub mod http;
/// Failure manifest persistence
pub mod manifest;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, FetchConfig, RetryConfig};
pub use error::{Error, ErrorDetail, Result};
pub use fetcher::{BatchFetcher, Fetcher, FnFetcher, fetch_all, fetch_fn};
pub use http::HttpJsonFetcher;
pub use manifest::{FailureManifest, ManifestEntry};
pub use types::{
    BatchOutcome, BatchSummary, Event, FetchResult, Identifier, failures, successes,
};
