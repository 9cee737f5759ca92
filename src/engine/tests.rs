//! Tests for the pagination driver

use super::*;
use crate::error::Error;
use crate::events::MemoryEventLog;
use crate::extract::FilteredRecord;
use crate::http::PageResponse;
use crate::session::ChannelSupplier;
use crate::sink::MemorySink;
use crate::state::CheckpointStore;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

// ============================================================================
// Fixtures
// ============================================================================

/// Fetcher answering from a per-page script; the last entry for a page repeats
#[derive(Clone, Default)]
struct ScriptedFetcher {
    script: Arc<Mutex<HashMap<u32, VecDeque<FetchOutcome>>>>,
    calls: Arc<Mutex<Vec<(u32, String)>>>,
}

impl ScriptedFetcher {
    fn on(self, page: u32, outcome: FetchOutcome) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(outcome);
        self
    }

    fn calls(&self) -> Vec<(u32, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn pages_called(&self) -> Vec<u32> {
        self.calls().into_iter().map(|(page, _)| page).collect()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(
        &self,
        _query: &str,
        page: u32,
        credential: &SessionCredential,
        _events: &mut dyn EventLog,
    ) -> Result<FetchOutcome> {
        self.calls
            .lock()
            .unwrap()
            .push((page, credential.expose().to_string()));

        let mut script = self.script.lock().unwrap();
        let queue = script.entry(page).or_default();
        let outcome = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(outcome.unwrap_or(FetchOutcome::Failed(FailureKind::Transient)))
    }
}

struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    async fn append(&mut self, _batch: &[FilteredRecord]) -> Result<()> {
        Err(Error::sink("disk full"))
    }
}

fn page(number: u32, records: usize, total_pages: u32) -> FetchOutcome {
    let results = (0..records)
        .map(|i| json!({"businessName": format!("Biz {number}-{i}")}))
        .collect();
    FetchOutcome::Page(PageResponse::new(
        results,
        u64::from(total_pages) * records as u64,
        total_pages,
    ))
}

fn credential(token: &str) -> SessionCredential {
    SessionCredential::new(token).unwrap()
}

fn no_delay() -> HarvestConfig {
    HarvestConfig::new().with_page_delay(Duration::ZERO)
}

struct Harness {
    engine: HarvestEngine,
    sink: MemorySink,
    events: MemoryEventLog,
}

fn harness(fetcher: &ScriptedFetcher, supplier: ChannelSupplier, config: HarvestConfig) -> Harness {
    let sink = MemorySink::new();
    let events = MemoryEventLog::new();
    let engine = HarvestEngine::new(
        Box::new(fetcher.clone()),
        Box::new(sink.clone()),
        Box::new(events.clone()),
        Box::new(supplier),
    )
    .with_config(config);

    Harness {
        engine,
        sink,
        events,
    }
}

/// Supplier whose desk is already closed: any renewal request means stop
fn closed_supplier() -> ChannelSupplier {
    let (supplier, desk) = ChannelSupplier::pair();
    drop(desk);
    supplier
}

fn names(records: &[FilteredRecord]) -> Vec<String> {
    records.iter().map(|r| r.business_name.clone()).collect()
}

// ============================================================================
// Config and State Tests
// ============================================================================

#[test]
fn test_harvest_config_default() {
    let config = HarvestConfig::default();
    assert_eq!(config.start_page, 1);
    assert_eq!(config.page_delay, Duration::from_secs(1));
}

#[test]
fn test_harvest_config_builder_clamps_start_page() {
    let config = HarvestConfig::new()
        .with_start_page(0)
        .with_page_delay(Duration::from_millis(250));
    assert_eq!(config.start_page, 1);
    assert_eq!(config.page_delay, Duration::from_millis(250));
}

#[test]
fn test_run_state_locks_totals_once() {
    let mut run = RunState::new("acme", credential("tok"), 1);

    assert!(run.lock_totals(&PageResponse::new(vec![], 100, 5)));
    assert!(!run.lock_totals(&PageResponse::new(vec![], 900, 9)));
    assert_eq!(run.total_pages, Some(5));
    assert_eq!(run.total_results, Some(100));
}

#[test]
fn test_run_state_missing_totals_default() {
    let mut run = RunState::new("acme", credential("tok"), 1);
    run.lock_totals(&PageResponse::default());

    assert_eq!(run.total_pages, Some(1));
    assert_eq!(run.total_results, Some(0));
    assert!(run.is_last_page());
}

#[test]
fn test_phase_terminal() {
    assert!(Phase::Done.is_terminal());
    assert!(Phase::Stopped(StopReason::OperatorQuit).is_terminal());
    assert!(!Phase::Init.is_terminal());
    assert!(!Phase::AwaitingCredential(FailureKind::Timeout).is_terminal());
}

#[test]
fn test_report_only_for_terminal_phase() {
    let run = RunState::new("acme", credential("tok"), 3);
    assert!(HarvestReport::from_run(&Phase::Fetching, &run).is_none());

    let report = HarvestReport::from_run(&Phase::Stopped(StopReason::OperatorQuit), &run).unwrap();
    assert_eq!(report.resume_page, Some(3));
}

// ============================================================================
// Step Tests
// ============================================================================

#[tokio::test]
async fn test_step_fetch_failure_moves_to_awaiting_credential() {
    let fetcher = ScriptedFetcher::default().on(1, FetchOutcome::Failed(FailureKind::SessionInvalid));
    let mut h = harness(&fetcher, closed_supplier(), no_delay());

    let run = RunState::new("acme", credential("tok"), 1);
    let (phase, run) = h.engine.step(Phase::Fetching, run).await.unwrap();

    assert_eq!(phase, Phase::AwaitingCredential(FailureKind::SessionInvalid));
    assert_eq!(run.cursor, 1);
}

// ============================================================================
// Run Tests
// ============================================================================

#[tokio::test]
async fn test_run_all_pages() {
    let fetcher = ScriptedFetcher::default()
        .on(1, page(1, 2, 3))
        .on(2, page(2, 2, 3))
        .on(3, page(3, 1, 3));
    let mut h = harness(&fetcher, closed_supplier(), no_delay());

    let report = h.engine.run("acme", credential("tok")).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Done);
    assert_eq!(report.collected, 5);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.total_pages, Some(3));
    assert_eq!(report.resume_page, None);
    assert_eq!(fetcher.pages_called(), vec![1, 2, 3]);
    assert_eq!(h.sink.writes(), 3);
    assert_eq!(
        h.events.statuses(),
        vec![EventStatus::SessionStart, EventStatus::Completed]
    );
    assert!(h.events.lines()[1].contains("Page: 1-3"));
}

#[tokio::test]
async fn test_total_pages_locked_from_first_page() {
    let fetcher = ScriptedFetcher::default()
        .on(1, page(1, 1, 5))
        .on(2, page(2, 1, 9))
        .on(3, page(3, 1, 2))
        .on(4, page(4, 1, 9))
        .on(5, page(5, 1, 9))
        .on(6, page(6, 1, 9));
    let mut h = harness(&fetcher, closed_supplier(), no_delay());

    let report = h.engine.run("acme", credential("tok")).await.unwrap();

    assert!(report.outcome.is_done());
    assert_eq!(report.total_pages, Some(5));
    assert_eq!(fetcher.pages_called(), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_session_invalid_resumes_same_page_with_new_credential() {
    let fetcher = ScriptedFetcher::default()
        .on(1, page(1, 2, 3))
        .on(2, FetchOutcome::Failed(FailureKind::SessionInvalid))
        .on(2, page(2, 2, 3))
        .on(3, page(3, 2, 3));

    let (supplier, mut desk) = ChannelSupplier::pair();
    let operator = tokio::spawn(async move {
        let ticket = desk.next().await.unwrap();
        let request = ticket.request.clone();
        ticket.replace("tok-2");
        request
    });

    let mut h = harness(&fetcher, supplier, no_delay());
    let report = h.engine.run("acme", credential("tok-1")).await.unwrap();
    let request = operator.await.unwrap();

    assert_eq!(request.page, 2);
    assert_eq!(request.reason, FailureKind::SessionInvalid);
    assert_eq!(
        fetcher.calls(),
        vec![
            (1, "tok-1".to_string()),
            (2, "tok-1".to_string()),
            (2, "tok-2".to_string()),
            (3, "tok-2".to_string()),
        ]
    );

    assert!(report.outcome.is_done());
    assert_eq!(report.collected, 6);
    assert_eq!(
        names(&h.sink.records()),
        vec!["Biz 1-0", "Biz 1-1", "Biz 2-0", "Biz 2-1", "Biz 3-0", "Biz 3-1"]
    );

    let new_session: Vec<_> = h
        .events
        .events()
        .into_iter()
        .filter(|e| e.status == EventStatus::NewSession)
        .collect();
    assert_eq!(new_session.len(), 1);
    assert_eq!(new_session[0].page, PageMarker::Page(2));
    assert_eq!(
        new_session[0].detail,
        "Entered new session ID, resuming from page 2"
    );
}

#[tokio::test]
async fn test_timeout_escalates_to_credential_renewal() {
    let fetcher = ScriptedFetcher::default()
        .on(1, FetchOutcome::Failed(FailureKind::Timeout))
        .on(1, page(1, 1, 1));

    let (supplier, mut desk) = ChannelSupplier::pair();
    let operator = tokio::spawn(async move {
        let ticket = desk.next().await.unwrap();
        let reason = ticket.request.reason;
        ticket.replace("tok-2");
        reason
    });

    let mut h = harness(&fetcher, supplier, no_delay());
    let report = h.engine.run("acme", credential("tok-1")).await.unwrap();

    assert_eq!(operator.await.unwrap(), FailureKind::Timeout);
    assert!(report.outcome.is_done());
    assert_eq!(report.collected, 1);
}

#[tokio::test]
async fn test_transient_exhaustion_stops_without_prompt() {
    let fetcher = ScriptedFetcher::default()
        .on(1, page(1, 3, 4))
        .on(2, FetchOutcome::Failed(FailureKind::Transient));
    let mut h = harness(&fetcher, closed_supplier(), no_delay());

    let report = h.engine.run("acme", credential("tok")).await.unwrap();

    assert_eq!(
        report.outcome,
        RunOutcome::Stopped(StopReason::RetriesExhausted)
    );
    assert_eq!(report.collected, 3);
    assert_eq!(report.resume_page, Some(2));
    assert_eq!(fetcher.pages_called(), vec![1, 2]);

    let last = h.events.events().pop().unwrap();
    assert_eq!(last.status, EventStatus::Stopped);
    assert_eq!(last.page, PageMarker::Page(2));
    assert_eq!(last.detail, "Failed after retries");
}

#[tokio::test]
async fn test_operator_quit_on_first_page() {
    let fetcher =
        ScriptedFetcher::default().on(1, FetchOutcome::Failed(FailureKind::SessionInvalid));

    let (supplier, mut desk) = ChannelSupplier::pair();
    tokio::spawn(async move {
        desk.next().await.unwrap().stop();
    });

    let mut h = harness(&fetcher, supplier, no_delay());
    let report = h.engine.run("acme", credential("tok")).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Stopped(StopReason::OperatorQuit));
    assert_eq!(report.collected, 0);
    assert_eq!(report.resume_page, Some(1));
    assert!(h.sink.records().is_empty());
    assert_eq!(h.events.count(EventStatus::SessionStart), 1);
    assert_eq!(h.events.count(EventStatus::Stopped), 1);
    assert_eq!(h.events.events().pop().unwrap().detail, "User chose to quit");
}

#[tokio::test]
async fn test_resume_from_stop_page_has_no_gap_or_duplicate() {
    let full_script = || {
        ScriptedFetcher::default()
            .on(1, page(1, 2, 4))
            .on(2, page(2, 2, 4))
            .on(3, page(3, 2, 4))
            .on(4, page(4, 1, 4))
    };

    // Reference: an uninterrupted run.
    let reference = full_script();
    let mut h = harness(&reference, closed_supplier(), no_delay());
    h.engine.run("acme", credential("tok")).await.unwrap();
    let expected = h.sink.records();

    // First run dies on page 3 and the operator quits.
    let first = ScriptedFetcher::default()
        .on(1, page(1, 2, 4))
        .on(2, page(2, 2, 4))
        .on(3, FetchOutcome::Failed(FailureKind::SessionInvalid));
    let sink = MemorySink::new();
    let mut engine = HarvestEngine::new(
        Box::new(first),
        Box::new(sink.clone()),
        Box::new(MemoryEventLog::new()),
        Box::new(closed_supplier()),
    )
    .with_config(no_delay());
    let stopped = engine.run("acme", credential("tok")).await.unwrap();
    assert_eq!(stopped.resume_page, Some(3));

    // Second run starts where the first one stopped, appending to the same sink.
    let second = full_script();
    let mut engine = HarvestEngine::new(
        Box::new(second.clone()),
        Box::new(sink.clone()),
        Box::new(MemoryEventLog::new()),
        Box::new(closed_supplier()),
    )
    .with_config(no_delay().with_start_page(3));
    let resumed = engine.run("acme", credential("tok-2")).await.unwrap();

    assert!(resumed.outcome.is_done());
    assert_eq!(second.pages_called(), vec![3, 4]);
    assert_eq!(names(&sink.records()), names(&expected));
    assert_eq!(stopped.collected + resumed.collected, expected.len() as u64);
}

#[tokio::test]
async fn test_start_page_past_last_page_finishes() {
    let fetcher = ScriptedFetcher::default().on(7, page(7, 0, 5));
    let mut h = harness(&fetcher, closed_supplier(), no_delay().with_start_page(7));

    let report = h.engine.run("acme", credential("tok")).await.unwrap();

    assert!(report.outcome.is_done());
    assert_eq!(fetcher.pages_called(), vec![7]);
}

#[tokio::test]
async fn test_empty_result_set() {
    let fetcher = ScriptedFetcher::default().on(1, page(1, 0, 0));
    let mut h = harness(&fetcher, closed_supplier(), no_delay());

    let report = h.engine.run("nothing", credential("tok")).await.unwrap();

    assert!(report.outcome.is_done());
    assert_eq!(report.collected, 0);
    assert_eq!(report.total_pages, Some(0));
}

#[tokio::test]
async fn test_sink_failure_aborts_run() {
    let fetcher = ScriptedFetcher::default().on(1, page(1, 1, 2));
    let mut engine = HarvestEngine::new(
        Box::new(fetcher),
        Box::new(FailingSink),
        Box::new(MemoryEventLog::new()),
        Box::new(closed_supplier()),
    )
    .with_config(no_delay());

    let err = engine.run("acme", credential("tok")).await.unwrap_err();
    assert!(err.to_string().contains("disk full"));
}

// ============================================================================
// Checkpoint Tests
// ============================================================================

#[tokio::test]
async fn test_checkpoint_records_stop_page() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));

    let fetcher = ScriptedFetcher::default()
        .on(1, page(1, 2, 5))
        .on(2, page(2, 2, 5))
        .on(3, FetchOutcome::Failed(FailureKind::SessionInvalid));
    let mut h = harness(&fetcher, closed_supplier(), no_delay());
    h.engine = h.engine.with_checkpoint(store.clone());

    h.engine.run("acme", credential("tok")).await.unwrap();

    let checkpoint = store.load().await.unwrap().unwrap();
    assert_eq!(checkpoint.query, "acme");
    assert_eq!(checkpoint.next_page, 3);
    assert_eq!(checkpoint.total_pages, Some(5));
    assert_eq!(checkpoint.collected, 4);
    assert_eq!(checkpoint.status, RunStatus::Stopped);
    assert_eq!(store.resume_page("acme").await.unwrap(), Some(3));
}

#[tokio::test]
async fn test_checkpoint_marks_completion() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));

    let fetcher = ScriptedFetcher::default().on(1, page(1, 1, 1));
    let mut h = harness(&fetcher, closed_supplier(), no_delay());
    h.engine = h.engine.with_checkpoint(store.clone());

    h.engine.run("acme", credential("tok")).await.unwrap();

    let checkpoint = store.load().await.unwrap().unwrap();
    assert_eq!(checkpoint.status, RunStatus::Completed);
    assert_eq!(store.resume_page("acme").await.unwrap(), None);
}

#[tokio::test]
async fn test_checkpoint_completion_at_highest_page() {
    let dir = tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoint.json"));

    let fetcher = ScriptedFetcher::default().on(u32::MAX, page(u32::MAX, 1, 3));
    let mut h = harness(
        &fetcher,
        closed_supplier(),
        no_delay().with_start_page(u32::MAX),
    );
    h.engine = h.engine.with_checkpoint(store.clone());

    let report = h.engine.run("acme", credential("tok")).await.unwrap();

    assert!(report.outcome.is_done());
    assert_eq!(fetcher.pages_called(), vec![u32::MAX]);

    let checkpoint = store.load().await.unwrap().unwrap();
    assert_eq!(checkpoint.status, RunStatus::Completed);
    assert_eq!(checkpoint.next_page, u32::MAX);
}
