//! # Wire Protocol
//!
//! JSON messages exchanged with the WebBoot Companion over the WebSocket.
//!
//! ## Outbound
//!
//! A single message shape, the job submission:
//!
//! ```json
//! {"action":"create","iso":"ubuntu.iso","filesystem":"FAT32","scheme":"MBR","device":"sdb"}
//! ```
//!
//! ## Inbound
//!
//! Every field is optional and applied independently:
//!
//! ```json
//! {"devices":[{"id":"sdb","name":"Kingston 8GB","size":8589934592}],
//!  "status":"Writing ISO...","progress":42,"current_operation":"iso writing"}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

/// The two destructive jobs the companion understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    /// Write a source image to the target device.
    Create,
    /// Return the target device to a generic usable state.
    Restore,
}

impl JobAction {
    pub fn as_str(self) -> &'static str {
        match self {
            JobAction::Create => "create",
            JobAction::Restore => "restore",
        }
    }

    /// Whether this action needs a source image.
    pub fn requires_image(self) -> bool {
        matches!(self, JobAction::Create)
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target filesystem for the prepared drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filesystem {
    #[default]
    #[serde(rename = "FAT32")]
    Fat32,
    #[serde(rename = "NTFS")]
    Ntfs,
    #[serde(rename = "exFAT")]
    ExFat,
}

impl Filesystem {
    pub fn label(self) -> &'static str {
        match self {
            Filesystem::Fat32 => "FAT32",
            Filesystem::Ntfs => "NTFS",
            Filesystem::ExFat => "exFAT",
        }
    }

    /// The next option in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Filesystem::Fat32 => Filesystem::Ntfs,
            Filesystem::Ntfs => Filesystem::ExFat,
            Filesystem::ExFat => Filesystem::Fat32,
        }
    }
}

impl fmt::Display for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Target partition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionScheme {
    #[default]
    #[serde(rename = "MBR")]
    Mbr,
    #[serde(rename = "GPT")]
    Gpt,
}

impl PartitionScheme {
    pub fn label(self) -> &'static str {
        match self {
            PartitionScheme::Mbr => "MBR",
            PartitionScheme::Gpt => "GPT",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PartitionScheme::Mbr => PartitionScheme::Gpt,
            PartitionScheme::Gpt => PartitionScheme::Mbr,
        }
    }
}

impl fmt::Display for PartitionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A removable-storage target as reported by the companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Stable identifier, usually a block device path.
    pub id: String,
    /// Display name (vendor and product).
    pub name: String,
    /// Capacity in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Filesystem label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mounted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u16>,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: None,
            label: None,
            mounted: None,
            mount_point: None,
            vendor_id: None,
            product_id: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// True when the companion reported the device as mounted, either
    /// explicitly or through a mount point.
    pub fn is_mounted(&self) -> bool {
        self.mounted.unwrap_or(false) || self.mount_point.is_some()
    }
}

/// An outgoing job instruction.
///
/// Only [`compose`](crate::session::composer::compose) builds one, and the
/// fields are read-only afterwards: a request is never altered once sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    action: JobAction,
    iso: Option<String>,
    filesystem: Filesystem,
    scheme: PartitionScheme,
    device: String,
}

impl JobRequest {
    pub(crate) fn new(
        action: JobAction,
        iso: Option<String>,
        filesystem: Filesystem,
        scheme: PartitionScheme,
        device: String,
    ) -> Self {
        Self {
            action,
            iso,
            filesystem,
            scheme,
            device,
        }
    }

    pub fn action(&self) -> JobAction {
        self.action
    }

    pub fn iso(&self) -> Option<&str> {
        self.iso.as_deref()
    }

    pub fn filesystem(&self) -> Filesystem {
        self.filesystem
    }

    pub fn scheme(&self) -> PartitionScheme {
        self.scheme
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Serialize to the wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A message pushed by the companion. Unknown fields are ignored, and a
/// field with an unexpected type is dropped on its own.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InboundMessage {
    #[serde(default, deserialize_with = "lenient")]
    pub devices: Option<Vec<Device>>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub progress: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_operation: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value::<Option<T>>(value) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            warn!(error = %err, "ignoring companion field with an unexpected type");
            Ok(None)
        }
    }
}

impl InboundMessage {
    /// Parse one frame. Anything other than a JSON object is an error.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
        serde_json::from_value(serde_json::Value::Object(object))
    }

    /// True when the message carries none of the known fields.
    pub fn is_empty(&self) -> bool {
        self.devices.is_none()
            && self.status.is_none()
            && self.progress.is_none()
            && self.current_operation.is_none()
    }
}

/// Render a byte count with binary units, e.g. `7.5 GiB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
