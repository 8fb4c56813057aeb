//! # Connection Manager
//!
//! Owns the single persistent link to the companion and its observable state.
//!
//! ```text
//!            connect()
//!   ┌───────────────────────────┐
//!   ▼                           │
//! Connecting ──Opened──▶ Open ──┼──Closed──▶ Closed
//!   │                    │      │
//!   └──Errored──▶ Errored ◀─────┘
//! ```
//!
//! A fresh connection starts in `Connecting` with the idle status until the
//! first dial.
//!
//! `Errored` and `Closed` are not terminal: [`Connection::connect`] disposes
//! whatever link is live and starts a new one. Each link is stamped with a
//! generation number so events that arrive late from a disposed link can be
//! told apart and ignored.

use crate::session::error::TransportError;
use std::fmt;
use tracing::{info, warn};

pub const STATUS_IDLE: &str = "Download WebBoot Companion to start";
pub const STATUS_CONNECTING: &str = "Connecting to WebBoot Companion...";
pub const STATUS_CONNECTED: &str = "Connected to WebBoot Companion";
pub const STATUS_NOT_RUNNING: &str =
    "Companion app not running. Install and start WebBoot Companion, then press R to reconnect";
pub const STATUS_DISCONNECTED: &str = "Companion app disconnected";
pub const STATUS_NOT_CONNECTED: &str = "Companion app not connected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closed => "disconnected",
            ConnectionState::Errored => "unavailable",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a link reports back about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Opened,
    Text(String),
    Errored(String),
    Closed,
}

/// A [`LinkEvent`] stamped with the generation of the link that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEnvelope {
    pub generation: u64,
    pub event: LinkEvent,
}

impl LinkEnvelope {
    pub fn new(generation: u64, event: LinkEvent) -> Self {
        Self { generation, event }
    }
}

/// The sending half of a live connection.
pub trait Link: Send {
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Tear the link down. Must be safe to call more than once.
    fn close(&mut self);
}

/// Opens links. Production code dials the WebSocket endpoint; tests record.
pub trait Connector: Send {
    fn open(&self, generation: u64) -> Box<dyn Link>;
}

pub struct Connection {
    state: ConnectionState,
    status: String,
    generation: u64,
    link: Option<Box<dyn Link>>,
    opened: bool,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// A connection that has not dialed yet.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
            status: STATUS_IDLE.to_string(),
            generation: 0,
            link: None,
            opened: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The "ready to send" predicate.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Dispose the current link (if any) and open a new one.
    pub fn connect(&mut self, connector: &dyn Connector) -> u64 {
        self.dispose();
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        self.status = STATUS_CONNECTING.to_string();
        self.opened = false;
        self.link = Some(connector.open(self.generation));
        info!(generation = self.generation, "connecting to companion");
        self.generation
    }

    /// Whether an event belongs to the live link.
    pub fn is_current(&self, generation: u64) -> bool {
        self.link.is_some() && generation == self.generation
    }

    pub fn mark_open(&mut self) {
        self.state = ConnectionState::Open;
        self.status = STATUS_CONNECTED.to_string();
        self.opened = true;
        info!(generation = self.generation, "companion connection open");
    }

    /// A transport-level failure. The wording depends on whether this link
    /// ever reached `Open`.
    pub fn mark_errored(&mut self, reason: &str) {
        self.state = ConnectionState::Errored;
        self.status = if self.opened {
            format!("Connection to WebBoot Companion lost: {}", reason)
        } else {
            STATUS_NOT_RUNNING.to_string()
        };
        warn!(generation = self.generation, %reason, "companion connection failed");
    }

    /// Remote-initiated close. An errored link stays errored.
    pub fn mark_closed(&mut self) {
        if self.state == ConnectionState::Errored {
            return;
        }
        self.state = ConnectionState::Closed;
        self.status = STATUS_DISCONNECTED.to_string();
        info!(generation = self.generation, "companion connection closed");
    }

    /// Send a text frame. Outside `Open` this is a no-op that only updates
    /// the status. Returns whether the frame was handed to the link.
    pub fn send(&mut self, text: String) -> bool {
        if self.state != ConnectionState::Open {
            self.status = STATUS_NOT_CONNECTED.to_string();
            warn!(state = %self.state, "send attempted while not connected");
            return false;
        }

        let Some(link) = self.link.as_mut() else {
            self.mark_errored("no live link");
            return false;
        };

        match link.send_text(text) {
            Ok(()) => true,
            Err(err) => {
                self.mark_errored(&err.to_string());
                false
            }
        }
    }

    /// Close and forget the live link without touching the visible state.
    pub fn dispose(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.dispose();
    }
}
