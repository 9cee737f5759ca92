//! Event types
//!
//! Every line carries a UTC timestamp at second precision.

use crate::types::PageMarker;
use chrono::{DateTime, Utc};
use std::fmt;

/// Timestamp layout used in log lines
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Status tag of an event line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    /// A page was fetched
    Success,
    /// An attempt failed and will not be retried
    Error,
    /// An attempt failed and will be retried
    Retry,
    /// The run started
    SessionStart,
    /// The operator supplied a replacement credential
    NewSession,
    /// The run stopped before the last page
    Stopped,
    /// Every page was fetched
    Completed,
}

impl EventStatus {
    /// Tag as written to the log
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Retry => "RETRY",
            Self::SessionStart => "SESSION_START",
            Self::NewSession => "NEW_SESSION",
            Self::Stopped => "STOPPED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the run log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestEvent {
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Search term of the run
    pub query: String,
    /// Page or phase marker
    pub page: PageMarker,
    /// Status tag
    pub status: EventStatus,
    /// Free-text detail, may be empty
    pub detail: String,
}

impl HarvestEvent {
    /// Create an event stamped with the current time
    pub fn new(
        query: impl Into<String>,
        page: PageMarker,
        status: EventStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            query: query.into(),
            page,
            status,
            detail: detail.into(),
        }
    }

    /// Create an event for a single page
    pub fn page(
        query: impl Into<String>,
        page: u32,
        status: EventStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(query, PageMarker::Page(page), status, detail)
    }

    /// Override the timestamp
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Format as a single log line (no trailing newline)
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{} UTC | Query: {} | Page: {} | Status: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.query,
            self.page,
            self.status
        );
        if !self.detail.is_empty() {
            line.push_str(" | ");
            line.push_str(&self.detail);
        }
        line
    }
}

impl fmt::Display for HarvestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
