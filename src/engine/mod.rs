//! Execution engine module
//!
//! The pagination driver: walks the pages of one query, persisting each page
//! as it arrives and suspending for a new credential when the session dies.
//!
//! # Overview
//!
//! ```text
//! Init → Fetching → Persisting → Advancing → Fetching ...
//!           │                        └──────→ Done
//!           ├─ SessionInvalid/Timeout → AwaitingCredential → Fetching (same page)
//!           │                                         └────→ Stopped
//!           └─ Transient (retries exhausted) ────────────────→ Stopped
//! ```
//!
//! Each transition takes the current [`RunState`] by value and returns the
//! updated one; collaborators (fetcher, sink, event log, credential supplier)
//! live on [`HarvestEngine`].

mod types;

pub use types::{HarvestConfig, HarvestReport, Phase, RunOutcome, RunState, StopReason};

use crate::error::{Error, Result};
use crate::events::{EventLog, EventStatus, HarvestEvent};
use crate::extract::{extract_all, FilteredRecord};
use crate::http::{FetchOutcome, PageFetcher};
use crate::session::{CredentialSupplier, Renewal, RenewalRequest};
use crate::sink::ResultSink;
use crate::state::{Checkpoint, CheckpointStore, RunStatus};
use crate::types::{FailureKind, PageMarker, SessionCredential};
use tracing::{debug, info, warn};

/// Pagination driver for a single query
pub struct HarvestEngine {
    fetcher: Box<dyn PageFetcher>,
    sink: Box<dyn ResultSink>,
    events: Box<dyn EventLog>,
    supplier: Box<dyn CredentialSupplier>,
    checkpoint: Option<CheckpointStore>,
    config: HarvestConfig,
}

impl HarvestEngine {
    /// Create an engine from its collaborators
    pub fn new(
        fetcher: Box<dyn PageFetcher>,
        sink: Box<dyn ResultSink>,
        events: Box<dyn EventLog>,
        supplier: Box<dyn CredentialSupplier>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            events,
            supplier,
            checkpoint: None,
            config: HarvestConfig::default(),
        }
    }

    /// Set harvest configuration
    #[must_use]
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// Write a resume checkpoint after every page and at the end of the run
    #[must_use]
    pub fn with_checkpoint(mut self, store: CheckpointStore) -> Self {
        self.checkpoint = Some(store);
        self
    }

    /// Get the harvest configuration
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Harvest every page of `query`, starting at the configured start page.
    ///
    /// Returns normally both when all pages were fetched and when the run
    /// stopped early; `Err` only for sink, log or checkpoint failures.
    pub async fn run(
        &mut self,
        query: &str,
        credential: SessionCredential,
    ) -> Result<HarvestReport> {
        let mut run = RunState::new(query, credential, self.config.start_page);
        let mut phase = Phase::Init;

        while !phase.is_terminal() {
            (phase, run) = self.step(phase, run).await?;
        }

        HarvestReport::from_run(&phase, &run)
            .ok_or_else(|| Error::Other(format!("run ended in non-terminal phase {phase:?}")))
    }

    /// Perform one state transition
    pub async fn step(&mut self, phase: Phase, run: RunState) -> Result<(Phase, RunState)> {
        match phase {
            Phase::Init => self.start(run).await,
            Phase::Fetching => self.fetch(run).await,
            Phase::Persisting(page) => {
                let records = extract_all(page.records());
                self.persist(run, &records).await
            }
            Phase::Advancing => self.advance(run).await,
            Phase::AwaitingCredential(reason) => self.await_credential(run, reason).await,
            terminal @ (Phase::Done | Phase::Stopped(_)) => Ok((terminal, run)),
        }
    }

    async fn start(&mut self, run: RunState) -> Result<(Phase, RunState)> {
        self.events.record(HarvestEvent::new(
            run.query.as_str(),
            PageMarker::Start,
            EventStatus::SessionStart,
            format!("Starting scrape for query: {}", run.query),
        ))?;
        info!("Starting from page {}", run.cursor);

        self.save_checkpoint(&run, run.cursor, RunStatus::InProgress)
            .await?;
        Ok((Phase::Fetching, run))
    }

    async fn fetch(&mut self, mut run: RunState) -> Result<(Phase, RunState)> {
        let outcome = self
            .fetcher
            .fetch_page(
                &run.query,
                run.cursor,
                &run.credential,
                self.events.as_mut(),
            )
            .await?;

        match outcome {
            FetchOutcome::Page(page) => {
                if run.lock_totals(&page) {
                    info!(
                        "Total pages: {}, Total results in database: {}",
                        run.total_pages.unwrap_or_default(),
                        run.total_results.unwrap_or_default()
                    );
                }
                Ok((Phase::Persisting(page), run))
            }
            FetchOutcome::Failed(kind) if kind.needs_new_credential() => {
                Ok((Phase::AwaitingCredential(kind), run))
            }
            FetchOutcome::Failed(_) => self.stop(run, StopReason::RetriesExhausted).await,
        }
    }

    async fn persist(
        &mut self,
        mut run: RunState,
        records: &[FilteredRecord],
    ) -> Result<(Phase, RunState)> {
        self.sink.append(records).await?;
        run.add_page(records.len());

        info!(
            "Page {} completed: {} results (Total so far: {})",
            run.cursor,
            records.len(),
            run.collected
        );
        Ok((Phase::Advancing, run))
    }

    async fn advance(&mut self, mut run: RunState) -> Result<(Phase, RunState)> {
        if run.is_last_page() {
            self.events.record(HarvestEvent::new(
                run.query.as_str(),
                PageMarker::Range {
                    first: self.config.start_page,
                    last: run.cursor,
                },
                EventStatus::Completed,
                format!("All pages fetched, total results: {}", run.collected),
            ))?;
            info!(
                "Completed! Fetched all {} pages.",
                run.total_pages.unwrap_or(run.cursor)
            );

            self.save_checkpoint(&run, run.cursor.saturating_add(1), RunStatus::Completed)
                .await?;
            return Ok((Phase::Done, run));
        }

        run.cursor += 1;
        self.save_checkpoint(&run, run.cursor, RunStatus::InProgress)
            .await?;

        if !self.config.page_delay.is_zero() {
            debug!("Waiting {:?} before page {}", self.config.page_delay, run.cursor);
            tokio::time::sleep(self.config.page_delay).await;
        }
        Ok((Phase::Fetching, run))
    }

    async fn await_credential(
        &mut self,
        mut run: RunState,
        reason: FailureKind,
    ) -> Result<(Phase, RunState)> {
        warn!(
            "Credential needed after {reason}, resume from page {}",
            run.cursor
        );

        let request = RenewalRequest {
            query: run.query.clone(),
            page: run.cursor,
            reason,
        };

        match self.supplier.request_renewal(&request).await? {
            Renewal::Replace(credential) => {
                run.credential = credential;
                self.events.record(HarvestEvent::page(
                    run.query.as_str(),
                    run.cursor,
                    EventStatus::NewSession,
                    format!("Entered new session ID, resuming from page {}", run.cursor),
                ))?;
                Ok((Phase::Fetching, run))
            }
            Renewal::Stop => self.stop(run, StopReason::OperatorQuit).await,
        }
    }

    async fn stop(&mut self, run: RunState, reason: StopReason) -> Result<(Phase, RunState)> {
        self.events.record(HarvestEvent::page(
            run.query.as_str(),
            run.cursor,
            EventStatus::Stopped,
            reason.to_string(),
        ))?;

        self.save_checkpoint(&run, run.cursor, RunStatus::Stopped)
            .await?;
        Ok((Phase::Stopped(reason), run))
    }

    async fn save_checkpoint(&self, run: &RunState, next_page: u32, status: RunStatus) -> Result<()> {
        let Some(store) = &self.checkpoint else {
            return Ok(());
        };

        let checkpoint = Checkpoint::new(run.query.as_str(), next_page)
            .with_total_pages(run.total_pages)
            .with_collected(run.collected)
            .with_status(status);
        store.save(&checkpoint).await
    }
}

impl std::fmt::Debug for HarvestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestEngine")
            .field("config", &self.config)
            .field("checkpoint", &self.checkpoint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
