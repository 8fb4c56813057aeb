//! # Session Module
//!
//! The client side of the WebBoot Companion protocol, free of any terminal or
//! socket code so it can be driven directly in tests.
//!
//! ## Components
//!
//! - [`connection`] - connection lifecycle and the `send` gate
//! - [`catalog`] - device snapshots and the current selection
//! - [`composer`] - job validation and construction
//! - [`progress`] - merge of pushed progress fields
//! - [`verifier`] - tagged device verification with stale-result discard
//! - [`console`] - the orchestrator owning all of the above
//!
//! ## Data flow
//!
//! ```text
//!  link events ──▶ Console ──▶ DeviceCatalog ──▶ DeviceVerifier ──▶ spawner
//!                    │    └──▶ ProgressState
//!  operator ───────▶ │
//!                    └──▶ compose() ──▶ Connection::send ──▶ link
//! ```

pub mod activity;
pub mod catalog;
pub mod composer;
pub mod connection;
pub mod console;
pub mod error;
pub mod progress;
pub mod protocol;
pub mod testing;
pub mod verifier;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog};
pub use catalog::{DeviceCatalog, SelectionChange};
pub use composer::{compose, JobForm};
pub use connection::{Connection, ConnectionState, Connector, Link, LinkEnvelope, LinkEvent};
pub use console::Console;
pub use error::{ComposeError, SubmitError, TransportError, VerificationError};
pub use progress::ProgressState;
pub use protocol::{
    format_size, Device, Filesystem, InboundMessage, JobAction, JobRequest, PartitionScheme,
};
pub use verifier::{
    DeviceInfo, DeviceProbe, DeviceVerifier, VerificationOutcome, VerificationSpawner,
    VerificationTicket,
};
