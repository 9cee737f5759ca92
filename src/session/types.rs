//! Renewal types and the supplier trait

use crate::error::Result;
use crate::types::{FailureKind, SessionCredential};
use async_trait::async_trait;

/// Operator input that ends the run instead of supplying a credential
pub const STOP_KEYWORD: &str = "quit";

/// Answer to a renewal request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renewal {
    /// Continue with this credential from the same page
    Replace(SessionCredential),
    /// End the run
    Stop,
}

impl Renewal {
    /// Interpret one line of operator input.
    ///
    /// `quit` (any case) stops; any other non-empty text is a credential.
    /// Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.eq_ignore_ascii_case(STOP_KEYWORD) {
            return Some(Self::Stop);
        }
        SessionCredential::new(input).map(Self::Replace)
    }

    /// Check if this is a stop answer
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// What the driver tells the supplier when it suspends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalRequest {
    /// Search term of the run
    pub query: String,
    /// Page the run resumes from
    pub page: u32,
    /// Why the current credential is considered dead
    pub reason: FailureKind,
}

/// Source of replacement credentials
#[async_trait]
pub trait CredentialSupplier: Send {
    /// Block until a replacement credential or a stop signal is available
    async fn request_renewal(&mut self, request: &RenewalRequest) -> Result<Renewal>;
}
