//! WebBoot Console - a terminal operator console for the WebBoot Companion
//!
//! This library provides the client side of the companion protocol (session
//! lifecycle, device selection, job composition, progress tracking and device
//! verification) together with the WebSocket runtime and the TUI built on top.

pub mod probe;
pub mod runtime;
pub mod session;
pub mod ui;
