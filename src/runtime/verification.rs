use crate::session::verifier::{
    verify, DeviceProbe, VerificationOutcome, VerificationSpawner, VerificationTicket,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs each verification as its own tokio task and sends the tagged outcome
/// back to the UI loop.
pub struct TokioVerificationSpawner {
    probe: Arc<dyn DeviceProbe>,
    timeout: Duration,
    outcomes: mpsc::UnboundedSender<VerificationOutcome>,
}

impl TokioVerificationSpawner {
    pub fn new(
        probe: Arc<dyn DeviceProbe>,
        timeout: Duration,
        outcomes: mpsc::UnboundedSender<VerificationOutcome>,
    ) -> Self {
        Self {
            probe,
            timeout,
            outcomes,
        }
    }
}

impl VerificationSpawner for TokioVerificationSpawner {
    fn spawn(&self, ticket: VerificationTicket) {
        let probe = Arc::clone(&self.probe);
        let timeout = self.timeout;
        let outcomes = self.outcomes.clone();

        tokio::spawn(async move {
            let result = verify(probe.as_ref(), ticket.device_id(), timeout).await;
            let _ = outcomes.send(VerificationOutcome { ticket, result });
        });
    }
}
