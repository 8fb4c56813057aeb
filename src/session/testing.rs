//! In-memory stand-ins for the transport and the verification runtime, so the
//! console can be driven deterministically without sockets or block devices.

use crate::session::connection::{Connector, Link};
use crate::session::error::TransportError;
use crate::session::verifier::{VerificationSpawner, VerificationTicket};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct LinkLedger {
    sent: Vec<String>,
    opened: usize,
    live: usize,
    fail_sends: bool,
}

/// A [`Connector`] whose links record every frame instead of sending it.
/// Clones share the same ledger.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    ledger: Arc<Mutex<LinkLedger>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self) -> MutexGuard<'_, LinkLedger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every frame handed to any link, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.ledger().sent.clone()
    }

    /// How many links were opened in total.
    pub fn opened(&self) -> usize {
        self.ledger().opened
    }

    /// How many links are open and not yet closed.
    pub fn live_links(&self) -> usize {
        self.ledger().live
    }

    /// Make subsequent sends fail as if the socket had gone away.
    pub fn fail_sends(&self, fail: bool) {
        self.ledger().fail_sends = fail;
    }
}

impl Connector for RecordingConnector {
    fn open(&self, _generation: u64) -> Box<dyn Link> {
        {
            let mut ledger = self.ledger();
            ledger.opened += 1;
            ledger.live += 1;
        }
        Box::new(RecordingLink {
            connector: self.clone(),
            closed: false,
        })
    }
}

struct RecordingLink {
    connector: RecordingConnector,
    closed: bool,
}

impl Link for RecordingLink {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let mut ledger = self.connector.ledger();
        if self.closed || ledger.fail_sends {
            return Err(TransportError::ChannelClosed);
        }
        ledger.sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.connector.ledger().live -= 1;
        }
    }
}

/// A [`VerificationSpawner`] that only remembers which tickets were issued.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpawner {
    tickets: Arc<Mutex<Vec<VerificationTicket>>>,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tickets(&self) -> Vec<VerificationTicket> {
        self.tickets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Device ids verification was requested for, oldest first.
    pub fn requested_devices(&self) -> Vec<String> {
        self.tickets()
            .iter()
            .map(|ticket| ticket.device_id().to_string())
            .collect()
    }
}

impl VerificationSpawner for RecordingSpawner {
    fn spawn(&self, ticket: VerificationTicket) {
        self.tickets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ticket);
    }
}
