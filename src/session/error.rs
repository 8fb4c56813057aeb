use std::time::Duration;
use thiserror::Error;

/// Local validation failures when composing a job. The display text is
/// what the operator sees on the status line.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Companion app not connected")]
    NotConnected,
    #[error("Please select an ISO image")]
    MissingImage,
    #[error("Please select a USB device")]
    MissingDevice,
}

/// Why a submission did not reach the companion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ComposeError),
    #[error("Waiting for device verification to finish")]
    VerificationPending,
    #[error("Job could not be encoded: {0}")]
    Encode(String),
    #[error("Job could not be delivered to WebBoot Companion")]
    NotDelivered,
}

/// Failures of the underlying connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("outbound channel closed")]
    ChannelClosed,
}

/// Device metadata probe failures. Never blocks a submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("device {0} does not exist")]
    NotFound(String),
    #[error("device probe failed: {0}")]
    Probe(String),
    #[error("unable to parse device information: {0}")]
    Unparseable(String),
    #[error("verification timed out after {0:?}")]
    TimedOut(Duration),
}
