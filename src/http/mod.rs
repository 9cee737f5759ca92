//! HTTP module
//!
//! Fetches single pages of the search API and classifies failures.
//!
//! # Features
//!
//! - **Bounded Retries**: `Transient` and `Timeout` failures are retried with a
//!   fixed backoff (2 retries, 3 attempts by default)
//! - **Session Detection**: HTTP 403 and body-level recaptcha/session errors
//!   are reported as `SessionInvalid` without retrying
//! - **Event Logging**: every attempt emits exactly one event line

mod client;
mod types;

pub use client::{
    HttpClientConfig, HttpClientConfigBuilder, SearchClient, DEFAULT_ENDPOINT, DEFAULT_REFERER,
    DEFAULT_SESSION_HEADER,
};
pub use types::{FetchOutcome, PageFetcher, PageResponse};
