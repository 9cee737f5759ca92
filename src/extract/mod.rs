//! Field extraction module
//!
//! Projects raw search results onto the seven-field [`FilteredRecord`] shape.
//!
//! # Overview
//!
//! Extraction is total: a missing key, a missing `agent` sub-object, or a
//! value that is not a string all become an empty string. Business semantics
//! (valid registration ids, known statuses) are not checked here.

mod types;

pub use types::{extract, extract_all, FilteredRecord};
