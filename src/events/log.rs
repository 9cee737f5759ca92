//! Event log implementations

use super::types::{EventStatus, HarvestEvent};
use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

/// Append-only sink for run events
pub trait EventLog: Send {
    /// Append one event
    fn record(&mut self, event: HarvestEvent) -> Result<()>;
}

/// Log file writer that mirrors every line to the console
#[derive(Debug)]
pub struct FileEventLog {
    path: PathBuf,
    file: File,
}

impl FileEventLog {
    /// Open (or create) the log file for appending, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::event_log(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::event_log(format!("Failed to open {}: {e}", path.display())))?;

        Ok(Self { path, file })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLog for FileEventLog {
    fn record(&mut self, event: HarvestEvent) -> Result<()> {
        let line = event.to_line();
        writeln!(self.file, "{line}")
            .and_then(|()| self.file.flush())
            .map_err(|e| Error::event_log(format!("Failed to append to log: {e}")))?;

        mirror(event.status, &line);
        Ok(())
    }
}

/// Echo a line to the console at a level matching its status
fn mirror(status: EventStatus, line: &str) {
    match status {
        EventStatus::Error => error!(target: "search_harvester::events", "{line}"),
        EventStatus::Retry | EventStatus::Stopped => {
            warn!(target: "search_harvester::events", "{line}");
        }
        _ => info!(target: "search_harvester::events", "{line}"),
    }
}

/// In-memory event log; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    events: Arc<Mutex<Vec<HarvestEvent>>>,
}

impl MemoryEventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event
    pub fn events(&self) -> Vec<HarvestEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded events formatted as log lines
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(HarvestEvent::to_line).collect()
    }

    /// Statuses in recording order
    pub fn statuses(&self) -> Vec<EventStatus> {
        self.events().iter().map(|e| e.status).collect()
    }

    /// Number of events with the given status
    pub fn count(&self, status: EventStatus) -> usize {
        self.events().iter().filter(|e| e.status == status).count()
    }
}

impl EventLog for MemoryEventLog {
    fn record(&mut self, event: HarvestEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| Error::event_log("event buffer lock poisoned"))?
            .push(event);
        Ok(())
    }
}
