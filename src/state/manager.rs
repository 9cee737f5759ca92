//! Checkpoint store implementation
//!
//! Provides file-based checkpoint persistence with atomic writes.

use super::types::Checkpoint;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Loads and saves the checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    /// Path to the checkpoint file
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store for the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path to the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint, `None` when no file exists yet
    pub async fn load(&self) -> Result<Option<Checkpoint>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to read checkpoint file: {e}")))?;

        let checkpoint = serde_json::from_str(&contents)
            .map_err(|e| Error::checkpoint(format!("Failed to parse checkpoint file: {e}")))?;

        Ok(Some(checkpoint))
    }

    /// Save the checkpoint, replacing any previous one
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let contents = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| Error::checkpoint(format!("Failed to serialize checkpoint: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::checkpoint(format!("Failed to create directory: {e}")))?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to write checkpoint file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to rename checkpoint file: {e}")))?;

        Ok(())
    }

    /// The page to resume `query` from, if the stored checkpoint applies
    pub async fn resume_page(&self, query: &str) -> Result<Option<u32>> {
        Ok(self
            .load()
            .await?
            .and_then(|checkpoint| checkpoint.resume_page(query)))
    }
}
