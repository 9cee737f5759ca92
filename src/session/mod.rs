//! Credential renewal module
//!
//! When the server invalidates the session (or requests keep timing out), the
//! driver suspends and asks a [`CredentialSupplier`] for a replacement token.
//!
//! # Overview
//!
//! - `Renewal` - the supplier's answer: a new credential, or stop
//! - `ChannelSupplier` / `RenewalDesk` - handoff over tokio channels, so the
//!   driver can be exercised without a terminal
//! - `Console` / `ConsoleSupplier` - interactive operator prompt

mod channel;
mod console;
mod types;

pub use channel::{ChannelSupplier, RenewalDesk, RenewalTicket};
pub use console::{Console, ConsoleSupplier, StdConsole};
pub use types::{CredentialSupplier, Renewal, RenewalRequest, STOP_KEYWORD};
