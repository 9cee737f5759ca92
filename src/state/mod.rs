//! Resume checkpoint module
//!
//! Records where a run left off so a later invocation can continue from the
//! same page.
//!
//! # Overview
//!
//! The state module provides:
//! - `Checkpoint` - query, next page, totals and run status
//! - `CheckpointStore` - file-based persistence with atomic writes

mod manager;
mod types;

pub use manager::CheckpointStore;
pub use types::{Checkpoint, RunStatus};
