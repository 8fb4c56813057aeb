//! # Progress Tracker
//!
//! A passive record of what the companion last said about the running job.
//! [`ProgressState::merge`] is the only way inbound data gets in: every field
//! present in a message overwrites its counterpart, every absent field is left
//! alone. There is no smoothing or interpolation.

use crate::session::protocol::InboundMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Percent complete, always within `0..=100`.
    pub percent: u8,
    /// Label of the step the companion is executing.
    pub operation: String,
    /// Last status line sent by the companion.
    pub status: String,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the progress fields of an inbound message. Returns whether any
    /// field was present.
    pub fn merge(&mut self, message: &InboundMessage) -> bool {
        let mut touched = false;

        if let Some(status) = &message.status {
            self.status.clone_from(status);
            touched = true;
        }
        if let Some(progress) = message.progress {
            self.percent = clamp_percent(progress);
            touched = true;
        }
        if let Some(operation) = &message.current_operation {
            self.operation.clone_from(operation);
            touched = true;
        }

        touched
    }

    /// Non-mutating form of [`merge`](Self::merge).
    pub fn merged(&self, message: &InboundMessage) -> Self {
        let mut next = self.clone();
        next.merge(message);
        next
    }

    /// Optimistic reset when a new job has just been handed to the companion.
    pub fn reset_for_job(&mut self, status: impl Into<String>) {
        self.percent = 0;
        self.operation.clear();
        self.status = status.into();
    }

    /// Gauge ratio in `0.0..=1.0`.
    pub fn ratio(&self) -> f64 {
        f64::from(self.percent) / 100.0
    }
}

/// Round into the `0..=100` domain. Non-finite input maps to 0.
pub fn clamp_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
