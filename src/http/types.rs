//! Page fetch types and the fetcher trait

use crate::error::Result;
use crate::events::EventLog;
use crate::types::{FailureKind, SessionCredential};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of one successful search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Raw result records
    #[serde(default)]
    pub results: Option<Vec<Value>>,
    /// Total result count (authoritative on the first page only)
    #[serde(default)]
    pub total: Option<u64>,
    /// Total page count (authoritative on the first page only)
    #[serde(default, rename = "totalPages")]
    pub total_pages: Option<u32>,
    /// Error reported inside a 2xx body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl PageResponse {
    /// Create a page with the given records and pagination metadata
    pub fn new(results: Vec<Value>, total: u64, total_pages: u32) -> Self {
        Self {
            results: Some(results),
            total: Some(total),
            total_pages: Some(total_pages),
            error: None,
        }
    }

    /// Raw records of this page (empty when `results` is absent)
    pub fn records(&self) -> &[Value] {
        self.results.as_deref().unwrap_or_default()
    }

    /// The body error text when it mentions recaptcha or session
    pub fn session_error(&self) -> Option<&str> {
        self.error.as_ref().and_then(Value::as_str).filter(|message| {
            let lower = message.to_lowercase();
            lower.contains("recaptcha") || lower.contains("session")
        })
    }
}

/// Result of fetching one page, after local retries
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The page was fetched
    Page(PageResponse),
    /// No page; the classified reason
    Failed(FailureKind),
}

impl FetchOutcome {
    /// The failure kind, if the fetch failed
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            Self::Page(_) => None,
            Self::Failed(kind) => Some(*kind),
        }
    }

    /// Check if a page was fetched
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page(_))
    }
}

/// Fetches one page of results for a query
///
/// Implementations own their retry policy and write one event per attempt
/// to `events`. They never touch the cursor or the credential.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `page` of `query` presenting `credential`
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        credential: &SessionCredential,
        events: &mut dyn EventLog,
    ) -> Result<FetchOutcome>;
}
