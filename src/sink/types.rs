//! Sink trait and in-memory implementation

use crate::error::{Error, Result};
use crate::extract::FilteredRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Durable destination for filtered records
#[async_trait]
pub trait ResultSink: Send {
    /// Persist one page worth of records as a single write
    async fn append(&mut self, batch: &[FilteredRecord]) -> Result<()>;
}

/// On-disk layout of the result file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// A single JSON array
    Json,
}

impl SinkFormat {
    /// Default file name for this format
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Jsonl => "output.jsonl",
            Self::Json => "output.json",
        }
    }
}

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryBuffer>>,
}

#[derive(Debug, Default)]
struct MemoryBuffer {
    records: Vec<FilteredRecord>,
    writes: usize,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record
    pub fn records(&self) -> Vec<FilteredRecord> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone()
    }

    /// Number of `append` calls received
    pub fn writes(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .writes
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn append(&mut self, batch: &[FilteredRecord]) -> Result<()> {
        let mut buffer = self
            .inner
            .lock()
            .map_err(|_| Error::sink("record buffer lock poisoned"))?;
        buffer.records.extend_from_slice(batch);
        buffer.writes += 1;
        Ok(())
    }
}
