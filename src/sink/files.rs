//! File-backed sinks

use super::types::{ResultSink, SinkFormat};
use crate::error::{Error, Result, ResultExt};
use crate::extract::FilteredRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Open the sink matching `format` at `path`
pub async fn open_sink(format: SinkFormat, path: impl AsRef<Path>) -> Result<Box<dyn ResultSink>> {
    Ok(match format {
        SinkFormat::Jsonl => Box::new(JsonLinesSink::open(path).await?),
        SinkFormat::Json => Box::new(JsonArraySink::open(path).await?),
    })
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::sink(format!("Failed to create {}: {e}", parent.display())))?;
    }
    Ok(())
}

// ============================================================================
// JSON Lines
// ============================================================================

/// Appends each batch as newline-delimited JSON
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
}

impl JsonLinesSink {
    /// Open (or create) the file for appending
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::sink(format!("Failed to open {}: {e}", path.display())))?;

        Ok(Self { path, file })
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn append(&mut self, batch: &[FilteredRecord]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut buffer = Vec::new();
        for record in batch {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }

        self.file
            .write_all(&buffer)
            .await
            .map_err(|e| Error::sink(format!("Failed to append records: {e}")))?;
        self.file
            .flush()
            .await
            .map_err(|e| Error::sink(format!("Failed to flush records: {e}")))?;
        self.file
            .sync_data()
            .await
            .map_err(|e| Error::sink(format!("Failed to sync records: {e}")))?;

        debug!("Appended {} records to {}", batch.len(), self.path.display());
        Ok(())
    }
}

// ============================================================================
// JSON Array
// ============================================================================

/// Keeps every record in one JSON array, rewritten on each append
#[derive(Debug)]
pub struct JsonArraySink {
    path: PathBuf,
}

impl JsonArraySink {
    /// Open the file, initializing it to `[]` when absent
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path).await?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            fs::write(&path, b"[]")
                .await
                .map_err(|e| Error::sink(format!("Failed to create {}: {e}", path.display())))?;
        }

        Ok(Self { path })
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_existing(&self) -> Result<Vec<Value>> {
        let contents = fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::sink(format!("Failed to read {}: {e}", self.path.display())))?;

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            Error::sink(format!(
                "{} is not a JSON array: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl ResultSink for JsonArraySink {
    async fn append(&mut self, batch: &[FilteredRecord]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut existing = self.read_existing().await?;
        for record in batch {
            existing.push(serde_json::to_value(record).context("Failed to encode record")?);
        }
        let contents =
            serde_json::to_string_pretty(&existing).context("Failed to encode output array")?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, contents.as_bytes())
            .await
            .map_err(|e| Error::sink(format!("Failed to write records: {e}")))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::sink(format!("Failed to replace output file: {e}")))?;

        debug!(
            "Appended {} records to {} ({} total)",
            batch.len(),
            self.path.display(),
            existing.len()
        );
        Ok(())
    }
}
