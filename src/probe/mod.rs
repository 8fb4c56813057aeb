//! # Device Probes
//!
//! Implementations of [`DeviceProbe`](crate::session::DeviceProbe) that
//! gather metadata shown to the operator before a destructive job.
//! The probe only reads; all writing is done by the companion.

mod lsblk;

pub use lsblk::{device_path, parse_lsblk, LsblkProbe};
