//! Channel handoff between the driver and an external credential source

use super::types::{CredentialSupplier, Renewal, RenewalRequest};
use crate::error::Result;
use crate::types::SessionCredential;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// A pending renewal request with its reply slot
#[derive(Debug)]
pub struct RenewalTicket {
    /// The driver's request
    pub request: RenewalRequest,
    reply: oneshot::Sender<Renewal>,
}

impl RenewalTicket {
    /// Answer the request
    pub fn respond(self, renewal: Renewal) {
        // The driver may have been dropped; nothing left to resume then.
        let _ = self.reply.send(renewal);
    }

    /// Answer with a replacement token; a blank token is answered as stop
    pub fn replace(self, token: &str) {
        let renewal = SessionCredential::new(token).map_or(Renewal::Stop, Renewal::Replace);
        self.respond(renewal);
    }

    /// Answer with stop
    pub fn stop(self) {
        self.respond(Renewal::Stop);
    }
}

/// Receiving end: whoever holds the desk answers renewal requests
#[derive(Debug)]
pub struct RenewalDesk {
    rx: mpsc::Receiver<RenewalTicket>,
}

impl RenewalDesk {
    /// Wait for the next request; `None` once the supplier is gone
    pub async fn next(&mut self) -> Option<RenewalTicket> {
        self.rx.recv().await
    }
}

/// Supplier that forwards requests to a [`RenewalDesk`]
#[derive(Debug, Clone)]
pub struct ChannelSupplier {
    tx: mpsc::Sender<RenewalTicket>,
}

impl ChannelSupplier {
    /// Create a connected supplier and desk
    pub fn pair() -> (Self, RenewalDesk) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, RenewalDesk { rx })
    }
}

#[async_trait]
impl CredentialSupplier for ChannelSupplier {
    async fn request_renewal(&mut self, request: &RenewalRequest) -> Result<Renewal> {
        let (reply, answer) = oneshot::channel();
        let ticket = RenewalTicket {
            request: request.clone(),
            reply,
        };

        if self.tx.send(ticket).await.is_err() {
            warn!("Renewal desk closed, stopping at page {}", request.page);
            return Ok(Renewal::Stop);
        }

        Ok(answer.await.unwrap_or_else(|_| {
            warn!("Renewal request dropped, stopping at page {}", request.page);
            Renewal::Stop
        }))
    }
}
