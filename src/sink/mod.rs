//! Result sink module
//!
//! Durable storage for filtered records, written once per fetched page.
//!
//! # Overview
//!
//! - `JsonLinesSink` - true incremental append, one JSON object per line
//! - `JsonArraySink` - a single pretty-printed JSON array, rewritten in full
//!   (read, extend, atomic replace) on every append; single writer only
//! - `MemorySink` - shared in-memory sink for tests and embedding

mod files;
mod types;

pub use files::{open_sink, JsonArraySink, JsonLinesSink};
pub use types::{MemorySink, ResultSink, SinkFormat};
