//! # UI Module
//!
//! The terminal operator console on top of [`Console`](crate::session::Console).
//!
//! ## Components
//!
//! - [`App`] - key handling, focus, image input and the confirmation modal
//! - [`mod@render`] - draws the console with ratatui
//! - [`config`] - persisted settings
//! - [`theme`] - color palettes
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  WebBoot Console  ws://localhost:8080  ● Open   │
//! ├─────────────────────┬───────────────────────────┤
//! │                     │  Job (image, fs, scheme)  │
//! │   USB Devices       ├───────────────────────────┤
//! │                     │  Device (verification)    │
//! ├─────────────────────┴───────────────────────────┤
//! │  Progress gauge + current operation             │
//! │  Status line                                    │
//! │  Activity log                                   │
//! │  Footer                                         │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod config;
pub mod render;
pub mod theme;

pub use app::App;
pub use render::render;
