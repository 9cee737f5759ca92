//! Common types used throughout the harvester
//!
//! This module contains shared type definitions and utility types
//! used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Session Credential
// ============================================================================

/// Opaque session token presented on every search request.
///
/// Replaced wholesale when the server invalidates it; never edited in place.
/// `Debug` output is redacted so the token does not leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    /// Wrap a raw token, trimming surrounding whitespace.
    ///
    /// Returns `None` when the token is empty after trimming.
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    /// The raw token as sent on the wire
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionCredential").field(&"***").finish()
    }
}

// ============================================================================
// Failure Classification
// ============================================================================

/// Classification of a page fetch that did not produce a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network error, non-2xx status (other than 403) or unreadable body
    Transient,
    /// The request did not complete within the client timeout
    Timeout,
    /// HTTP 403, or a body-level recaptcha/session error
    SessionInvalid,
}

impl FailureKind {
    /// Whether the fetcher retries this kind locally
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::Timeout)
    }

    /// Whether the driver escalates this kind to credential renewal.
    ///
    /// Timeouts escalate because a stalled session looks the same as a slow
    /// server from here.
    pub fn needs_new_credential(self) -> bool {
        matches!(self, Self::SessionInvalid | Self::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient error"),
            Self::Timeout => write!(f, "timeout"),
            Self::SessionInvalid => write!(f, "session invalid"),
        }
    }
}

// ============================================================================
// Page Marker
// ============================================================================

/// The page column of an event line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    /// Run-level event emitted before any page is fetched
    Start,
    /// A single page
    Page(u32),
    /// An inclusive page range, used on completion
    Range {
        /// First page of the run
        first: u32,
        /// Last page of the result set
        last: u32,
    },
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Page(page) => write!(f, "{page}"),
            Self::Range { first, last } => write!(f, "{first}-{last}"),
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}
