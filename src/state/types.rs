//! Checkpoint types
//!
//! These types are serialized to JSON and persisted between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a run stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Pages are still being fetched
    #[default]
    InProgress,
    /// The run ended before the last page
    Stopped,
    /// Every page was fetched
    Completed,
}

/// Resume point of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Search term of the run
    pub query: String,
    /// Next page to fetch
    pub next_page: u32,
    /// Total page count, once known
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Records persisted by the run that wrote this checkpoint
    #[serde(default)]
    pub collected: u64,
    /// Run status
    #[serde(default)]
    pub status: RunStatus,
    /// When the checkpoint was written
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create an in-progress checkpoint stamped now
    pub fn new(query: impl Into<String>, next_page: u32) -> Self {
        Self {
            query: query.into(),
            next_page,
            total_pages: None,
            collected: 0,
            status: RunStatus::InProgress,
            updated_at: Utc::now(),
        }
    }

    /// Set the total page count
    #[must_use]
    pub fn with_total_pages(mut self, total_pages: Option<u32>) -> Self {
        self.total_pages = total_pages;
        self
    }

    /// Set the collected count
    #[must_use]
    pub fn with_collected(mut self, collected: u64) -> Self {
        self.collected = collected;
        self
    }

    /// Set the status
    #[must_use]
    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = status;
        self
    }

    /// The page to resume `query` from, if this checkpoint applies to it
    pub fn resume_page(&self, query: &str) -> Option<u32> {
        (self.query == query && self.status != RunStatus::Completed).then_some(self.next_page)
    }
}
