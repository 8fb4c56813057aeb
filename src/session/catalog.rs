//! # Device Catalog
//!
//! Holds the latest device snapshot pushed by the companion and the current
//! selection. Snapshots replace the list wholesale; they are never deltas.
//!
//! ## Reselection policy
//!
//! When a snapshot arrives, a selection that is still present is kept.
//! Otherwise the first entry of the new snapshot is selected, or the
//! selection is cleared when the snapshot is empty.

use crate::session::protocol::Device;

/// Result of an operation that may move the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    /// The selected id changed; `None` means the selection was cleared.
    Changed(Option<String>),
}

#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<Device>,
    selected: Option<String>,
    snapshots: u64,
}

impl DeviceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Number of snapshots received so far.
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_device(&self) -> Option<&Device> {
        let id = self.selected.as_deref()?;
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_deref()?;
        self.devices.iter().position(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id)
    }

    /// Replace the list with a fresh snapshot and apply the reselection policy.
    pub fn replace(&mut self, devices: Vec<Device>) -> SelectionChange {
        self.devices = devices;
        self.snapshots += 1;

        let still_present = self
            .selected
            .as_deref()
            .is_some_and(|id| self.devices.iter().any(|d| d.id == id));
        if still_present {
            return SelectionChange::Unchanged;
        }

        let next = self.devices.first().map(|d| d.id.clone());
        self.set_selection(next)
    }

    /// Explicit user selection. Ids not in the snapshot are ignored.
    pub fn select(&mut self, id: &str) -> SelectionChange {
        if !self.contains(id) {
            return SelectionChange::Unchanged;
        }
        self.set_selection(Some(id.to_string()))
    }

    /// Move the selection one entry down, wrapping around.
    pub fn select_next(&mut self) -> SelectionChange {
        let count = self.devices.len();
        if count == 0 {
            return SelectionChange::Unchanged;
        }
        let index = match self.selected_index() {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        let id = self.devices[index].id.clone();
        self.set_selection(Some(id))
    }

    /// Move the selection one entry up, wrapping around.
    pub fn select_previous(&mut self) -> SelectionChange {
        let count = self.devices.len();
        if count == 0 {
            return SelectionChange::Unchanged;
        }
        let index = match self.selected_index() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        let id = self.devices[index].id.clone();
        self.set_selection(Some(id))
    }

    fn set_selection(&mut self, next: Option<String>) -> SelectionChange {
        if self.selected == next {
            return SelectionChange::Unchanged;
        }
        self.selected = next.clone();
        SelectionChange::Changed(next)
    }
}
