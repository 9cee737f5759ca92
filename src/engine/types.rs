//! Engine types
//!
//! Run state, driver phases, configuration and the final report.

use crate::http::PageResponse;
use crate::types::{FailureKind, SessionCredential};
use std::fmt;
use std::time::Duration;

/// Configuration for a harvest run
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// First page to fetch (1-based)
    pub start_page: u32,
    /// Pause between consecutive pages
    pub page_delay: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            start_page: 1,
            page_delay: Duration::from_secs(1),
        }
    }
}

impl HarvestConfig {
    /// Create a new harvest config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start page (clamped to at least 1)
    #[must_use]
    pub fn with_start_page(mut self, page: u32) -> Self {
        self.start_page = page.max(1);
        self
    }

    /// Set the delay between pages
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }
}

/// Everything the driver knows about a run in progress
#[derive(Debug, Clone)]
pub struct RunState {
    /// Search term (fixed for the run)
    pub query: String,
    /// Next page to fetch; unchanged across a credential replacement
    pub cursor: u32,
    /// Credential presented on every request
    pub credential: SessionCredential,
    /// Total page count, captured from the first successful page
    pub total_pages: Option<u32>,
    /// Total result count, captured from the first successful page
    pub total_results: Option<u64>,
    /// Records persisted so far
    pub collected: u64,
    /// Pages persisted so far
    pub pages_fetched: u32,
}

impl RunState {
    /// Fresh state positioned at `start_page`
    pub fn new(query: impl Into<String>, credential: SessionCredential, start_page: u32) -> Self {
        Self {
            query: query.into(),
            cursor: start_page.max(1),
            credential,
            total_pages: None,
            total_results: None,
            collected: 0,
            pages_fetched: 0,
        }
    }

    /// Capture pagination totals from `page` unless already captured.
    ///
    /// Returns `true` when this call captured them. Missing `totalPages`
    /// counts as 1 and missing `total` as 0.
    pub fn lock_totals(&mut self, page: &PageResponse) -> bool {
        if self.total_pages.is_some() {
            return false;
        }
        self.total_pages = Some(page.total_pages.unwrap_or(1));
        self.total_results = Some(page.total.unwrap_or(0));
        true
    }

    /// Whether the cursor sits on (or past) the last page
    pub fn is_last_page(&self) -> bool {
        self.total_pages.is_some_and(|total| self.cursor >= total)
    }

    /// Record a persisted page
    pub fn add_page(&mut self, records: usize) {
        self.collected += records as u64;
        self.pages_fetched += 1;
    }
}

/// Why a run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The operator answered a renewal request with stop
    OperatorQuit,
    /// A transient failure outlasted the retry budget
    RetriesExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorQuit => write!(f, "User chose to quit"),
            Self::RetriesExhausted => write!(f, "Failed after retries"),
        }
    }
}

/// Driver state machine phase
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Log session start
    Init,
    /// Fetch the page at the cursor
    Fetching,
    /// Extract and persist a fetched page
    Persisting(PageResponse),
    /// Finish or move the cursor forward
    Advancing,
    /// Wait for a replacement credential
    AwaitingCredential(FailureKind),
    /// Every page was fetched
    Done,
    /// The run ended early
    Stopped(StopReason),
}

impl Phase {
    /// Check if the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Stopped(_))
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every page was fetched
    Done,
    /// The run ended early
    Stopped(StopReason),
}

impl RunOutcome {
    /// Check if every page was fetched
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Summary returned when a run ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// How the run ended
    pub outcome: RunOutcome,
    /// Records persisted by this run
    pub collected: u64,
    /// Pages persisted by this run
    pub pages_fetched: u32,
    /// Total page count reported by the API
    pub total_pages: Option<u32>,
    /// Total result count reported by the API
    pub total_results: Option<u64>,
    /// Page to pass as start page to resume, for stopped runs
    pub resume_page: Option<u32>,
}

impl HarvestReport {
    /// Build the report for a terminal phase.
    ///
    /// Returns `None` if `phase` is not terminal.
    pub fn from_run(phase: &Phase, run: &RunState) -> Option<Self> {
        let (outcome, resume_page) = match phase {
            Phase::Done => (RunOutcome::Done, None),
            Phase::Stopped(reason) => (RunOutcome::Stopped(*reason), Some(run.cursor)),
            _ => return None,
        };

        Some(Self {
            outcome,
            collected: run.collected,
            pages_fetched: run.pages_fetched,
            total_pages: run.total_pages,
            total_results: run.total_results,
            resume_page,
        })
    }
}
