//! # Runtime Adapters
//!
//! Tokio-backed implementations of the seams the [`session`](crate::session)
//! core is written against:
//!
//! - [`WebSocketConnector`] opens [`WsLink`]s to the companion endpoint
//! - [`TokioVerificationSpawner`] runs device probes in the background
//!
//! Both report back over unbounded channels that the UI loop drains with
//! [`drain_pending`], so console state is only ever touched from one place.

mod verification;
mod websocket;

pub use verification::TokioVerificationSpawner;
pub use websocket::{WebSocketConnector, WsLink};

use crate::session::{Console, LinkEnvelope, VerificationOutcome};
use tokio::sync::mpsc;

/// Receiving ends of the runtime channels.
pub struct RuntimeChannels {
    pub links: mpsc::UnboundedReceiver<LinkEnvelope>,
    pub verifications: mpsc::UnboundedReceiver<VerificationOutcome>,
}

/// Sending ends, handed to the connector and the spawner.
pub struct RuntimeSenders {
    pub links: mpsc::UnboundedSender<LinkEnvelope>,
    pub verifications: mpsc::UnboundedSender<VerificationOutcome>,
}

pub fn channels() -> (RuntimeSenders, RuntimeChannels) {
    let (links_tx, links_rx) = mpsc::unbounded_channel();
    let (verify_tx, verify_rx) = mpsc::unbounded_channel();
    (
        RuntimeSenders {
            links: links_tx,
            verifications: verify_tx,
        },
        RuntimeChannels {
            links: links_rx,
            verifications: verify_rx,
        },
    )
}

/// Hand every queued event to the console in arrival order. Returns how many
/// events were processed.
pub fn drain_pending(console: &mut Console, channels: &mut RuntimeChannels) -> usize {
    let mut handled = 0;
    while let Ok(envelope) = channels.links.try_recv() {
        console.handle_link_event(envelope);
        handled += 1;
    }
    while let Ok(outcome) = channels.verifications.try_recv() {
        console.complete_verification(outcome);
        handled += 1;
    }
    handled
}

/// Wait for the next event on either channel and hand it to the console.
/// Returns `false` once both channels are closed.
pub async fn process_next(console: &mut Console, channels: &mut RuntimeChannels) -> bool {
    tokio::select! {
        Some(envelope) = channels.links.recv() => {
            console.handle_link_event(envelope);
            true
        }
        Some(outcome) = channels.verifications.recv() => {
            console.complete_verification(outcome);
            true
        }
        else => false,
    }
}
