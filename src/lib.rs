// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Search Harvester
//!
//! Walks every page of a paginated, session-gated search API, keeps a fixed
//! subset of fields from each result and appends them to a local file as
//! each page arrives.
//!
//! ## Features
//!
//! - **Bounded retry**: transient failures and timeouts are retried with a fixed backoff
//! - **Credential renewal**: an expired session suspends the run until the operator
//!   supplies a new one, then the same page is fetched again
//! - **Incremental output**: every page is persisted before the next is requested
//! - **Resume**: a checkpoint records the next page after every persisted page
//! - **Event log**: one timestamped line per attempt and per lifecycle event
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use search_harvester::engine::HarvestEngine;
//! use search_harvester::events::FileEventLog;
//! use search_harvester::http::{HttpClientConfig, SearchClient};
//! use search_harvester::session::{ConsoleSupplier, StdConsole};
//! use search_harvester::sink::{open_sink, SinkFormat};
//! use search_harvester::{Result, SessionCredential};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = SearchClient::new(HttpClientConfig::default())?;
//!     let sink = open_sink(SinkFormat::Jsonl, "search_results/output.jsonl").await?;
//!     let events = FileEventLog::open("search_results/scraper.log")?;
//!     let supplier = ConsoleSupplier::new(StdConsole::stdio());
//!
//!     let mut engine =
//!         HarvestEngine::new(Box::new(client), sink, Box::new(events), Box::new(supplier));
//!
//!     let credential = SessionCredential::new("session-token")
//!         .ok_or_else(|| search_harvester::Error::config("empty session"))?;
//!     let report = engine.run("acme", credential).await?;
//!     println!("collected {} records", report.collected);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        HarvestEngine                         │
//! │   Init → Fetching → Persisting → Advancing → Done            │
//! │             └→ AwaitingCredential → Fetching | Stopped       │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬───────────┬────┴──────┬────────────┬───────────┐
//! │ PageFetcher│ Extract   │ ResultSink│ EventLog   │ Credential│
//! ├────────────┼───────────┼───────────┼────────────┼───────────┤
//! │ Search API │ 7 fields  │ JSON Lines│ Log file   │ Console   │
//! │ Retry      │           │ JSON array│ + tracing  │ Channel   │
//! └────────────┴───────────┴───────────┴────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the harvester
pub mod error;

/// Common types and type aliases
pub mod types;

/// Field extraction from raw result records
pub mod extract;

/// Search API client with bounded retry
pub mod http;

/// Credential renewal
pub mod session;

/// Timestamped run event log
pub mod events;

/// Result persistence
pub mod sink;

/// Resume checkpoints
pub mod state;

/// Pagination driver
pub mod engine;

/// Settings file and defaults
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use engine::{HarvestConfig, HarvestEngine, HarvestReport, RunOutcome, StopReason};
pub use extract::FilteredRecord;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
