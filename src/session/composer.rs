//! # Job Composer
//!
//! Turns the form state into a [`JobRequest`], or explains why it cannot.
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. the connection must be open ([`ComposeError::NotConnected`])
//! 2. `create` needs a source image ([`ComposeError::MissingImage`])
//! 3. a target device must be selected ([`ComposeError::MissingDevice`])
//!
//! [`compose`] is pure. Sending and the optimistic progress reset happen in
//! [`Console::submit`](crate::session::Console::submit).

use crate::session::connection::ConnectionState;
use crate::session::error::ComposeError;
use crate::session::protocol::{Filesystem, JobAction, JobRequest, PartitionScheme};

/// Operator choices that feed into the next job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobForm {
    image: Option<String>,
    pub filesystem: Filesystem,
    pub scheme: PartitionScheme,
}

impl JobForm {
    pub fn new(filesystem: Filesystem, scheme: PartitionScheme) -> Self {
        Self {
            image: None,
            filesystem,
            scheme,
        }
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Set or clear the source image. Blank input clears it.
    pub fn set_image(&mut self, image: Option<String>) {
        self.image = image
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }

    pub fn cycle_filesystem(&mut self) {
        self.filesystem = self.filesystem.next();
    }

    pub fn cycle_scheme(&mut self) {
        self.scheme = self.scheme.next();
    }
}

/// Validate and build a job request from the current state.
pub fn compose(
    action: JobAction,
    state: ConnectionState,
    form: &JobForm,
    device: Option<&str>,
) -> Result<JobRequest, ComposeError> {
    if state != ConnectionState::Open {
        return Err(ComposeError::NotConnected);
    }

    let iso = match action {
        JobAction::Create => Some(form.image().ok_or(ComposeError::MissingImage)?.to_string()),
        JobAction::Restore => None,
    };

    let device = device
        .filter(|d| !d.is_empty())
        .ok_or(ComposeError::MissingDevice)?;

    Ok(JobRequest::new(
        action,
        iso,
        form.filesystem,
        form.scheme,
        device.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_image(image: &str) -> JobForm {
        let mut form = JobForm::default();
        form.set_image(Some(image.to_string()));
        form
    }

    #[test]
    fn test_not_connected_wins_over_everything() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Closed,
            ConnectionState::Errored,
        ] {
            let result = compose(JobAction::Create, state, &JobForm::default(), None);
            assert_eq!(result, Err(ComposeError::NotConnected));
        }
    }

    #[test]
    fn test_create_without_image_regardless_of_device() {
        let form = JobForm::default();
        for device in [None, Some("sdb")] {
            let result = compose(JobAction::Create, ConnectionState::Open, &form, device);
            assert_eq!(result, Err(ComposeError::MissingImage));
        }
    }

    #[test]
    fn test_missing_device_even_for_restore_with_image() {
        let form = form_with_image("ubuntu.iso");
        let result = compose(JobAction::Restore, ConnectionState::Open, &form, None);
        assert_eq!(result, Err(ComposeError::MissingDevice));

        let result = compose(JobAction::Restore, ConnectionState::Open, &form, Some(""));
        assert_eq!(result, Err(ComposeError::MissingDevice));
    }

    #[test]
    fn test_create_request_uses_form_defaults() {
        let form = form_with_image("ubuntu.iso");
        let job = compose(JobAction::Create, ConnectionState::Open, &form, Some("sdb")).unwrap();
        assert_eq!(job.action(), JobAction::Create);
        assert_eq!(job.iso(), Some("ubuntu.iso"));
        assert_eq!(job.filesystem(), Filesystem::Fat32);
        assert_eq!(job.scheme(), PartitionScheme::Mbr);
        assert_eq!(job.device(), "sdb");
    }

    #[test]
    fn test_restore_needs_no_image_and_sends_none() {
        let form = form_with_image("ubuntu.iso");
        let job = compose(JobAction::Restore, ConnectionState::Open, &form, Some("sdb")).unwrap();
        assert_eq!(job.iso(), None);

        let job = compose(
            JobAction::Restore,
            ConnectionState::Open,
            &JobForm::default(),
            Some("sdb"),
        )
        .unwrap();
        assert_eq!(job.action(), JobAction::Restore);
    }

    #[test]
    fn test_overrides_flow_into_request() {
        let mut form = form_with_image("arch.iso");
        form.cycle_filesystem();
        form.cycle_scheme();
        let job = compose(JobAction::Create, ConnectionState::Open, &form, Some("sdc")).unwrap();
        assert_eq!(job.filesystem(), Filesystem::Ntfs);
        assert_eq!(job.scheme(), PartitionScheme::Gpt);
    }

    #[test]
    fn test_blank_image_clears() {
        let mut form = form_with_image("ubuntu.iso");
        form.set_image(Some("   ".to_string()));
        assert_eq!(form.image(), None);
    }
}
