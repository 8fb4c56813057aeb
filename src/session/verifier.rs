//! # Device Verifier
//!
//! Every change of the selected device starts a verification that produces
//! [`DeviceInfo`] for the confirmation step. Verification is asynchronous, so
//! the operator can move on to another device before it finishes. Each
//! request carries a [`VerificationTicket`] naming the device it was issued
//! for; when the outcome comes back it is applied only if that device is
//! still the selection. Nothing is cancelled, late results are simply dropped.
//!
//! While the ticket for the current selection is outstanding the console
//! reports "verifying" and refuses destructive actions. A failed probe does
//! not block anything; it is logged and leaves the metadata empty.

use crate::session::error::VerificationError;
use futures_util::future::BoxFuture;
use std::time::Duration;
use tracing::{debug, warn};

/// Metadata about a verified device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub path: String,
    pub size: u64,
    pub filesystem: Option<String>,
    pub mounted: bool,
    pub mount_points: Vec<String>,
}

/// Tag attached to an outstanding verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTicket {
    device_id: String,
    seq: u64,
}

impl VerificationTicket {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// A finished verification on its way back to the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub ticket: VerificationTicket,
    pub result: Result<DeviceInfo, VerificationError>,
}

/// What [`DeviceVerifier::complete`] did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed(VerificationError),
    /// The selection moved on before the result arrived.
    Stale,
}

/// Looks up metadata for a device id.
pub trait DeviceProbe: Send + Sync {
    fn probe<'a>(&'a self, device_id: &'a str) -> BoxFuture<'a, Result<DeviceInfo, VerificationError>>;
}

/// Starts verifications in the background. Outcomes come back to the console
/// through [`Console::complete_verification`](crate::session::Console::complete_verification).
pub trait VerificationSpawner: Send {
    fn spawn(&self, ticket: VerificationTicket);
}

/// Run one probe, bounded by `timeout`.
pub async fn verify(
    probe: &dyn DeviceProbe,
    device_id: &str,
    timeout: Duration,
) -> Result<DeviceInfo, VerificationError> {
    match tokio::time::timeout(timeout, probe.probe(device_id)).await {
        Ok(result) => result,
        Err(_) => Err(VerificationError::TimedOut(timeout)),
    }
}

#[derive(Debug, Default)]
pub struct DeviceVerifier {
    next_seq: u64,
    target: Option<String>,
    pending: Option<VerificationTicket>,
    info: Option<DeviceInfo>,
    failure: Option<VerificationError>,
}

impl DeviceVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selection changed. Clears previous results and issues a ticket
    /// unless the selection is now empty.
    pub fn begin(&mut self, device_id: Option<&str>) -> Option<VerificationTicket> {
        self.info = None;
        self.failure = None;
        self.target = device_id.map(str::to_string);

        let Some(device_id) = device_id else {
            self.pending = None;
            return None;
        };

        self.next_seq += 1;
        let ticket = VerificationTicket {
            device_id: device_id.to_string(),
            seq: self.next_seq,
        };
        self.pending = Some(ticket.clone());
        Some(ticket)
    }

    pub fn complete(&mut self, outcome: VerificationOutcome) -> Completion {
        let VerificationOutcome { ticket, result } = outcome;

        if self.target.as_deref() != Some(ticket.device_id()) {
            debug!(
                device = ticket.device_id(),
                seq = ticket.seq(),
                "discarding stale verification result"
            );
            return Completion::Stale;
        }

        if self.pending.as_ref().is_some_and(|p| p.seq == ticket.seq) {
            self.pending = None;
        }

        match result {
            Ok(info) => {
                self.info = Some(info);
                self.failure = None;
                Completion::Applied
            }
            Err(err) => {
                warn!(device = ticket.device_id(), error = %err, "device verification failed");
                self.info = None;
                self.failure = Some(err.clone());
                Completion::Failed(err)
            }
        }
    }

    pub fn is_verifying(&self) -> bool {
        self.pending.is_some()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    pub fn failure(&self) -> Option<&VerificationError> {
        self.failure.as_ref()
    }
}
