//! Event log module
//!
//! Append-only run log: one line per fetch attempt and per driver transition.
//!
//! # Overview
//!
//! - `HarvestEvent` - a single timestamped line (query, page marker, status, detail)
//! - `EventLog` - the sink trait the fetcher and driver write through
//! - `FileEventLog` - durable append to a log file, mirrored to the console via `tracing`
//! - `MemoryEventLog` - shared in-memory log for tests and embedding

mod log;
mod types;

pub use log::{EventLog, FileEventLog, MemoryEventLog};
pub use types::{EventStatus, HarvestEvent};
