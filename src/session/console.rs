//! # Console
//!
//! The orchestration object that owns one session with the companion and
//! everything hanging off it. It is explicitly constructed with the
//! [`Connector`] and [`VerificationSpawner`] it should use and is driven by
//! three kinds of events, each handled to completion before the next:
//!
//! - link events ([`Console::handle_link_event`])
//! - operator actions (selection, form edits, [`Console::submit`])
//! - finished verifications ([`Console::complete_verification`])
//!
//! The status line shown to the operator is whichever of these last had
//! something to say.

use crate::session::activity::ActivityLog;
use crate::session::catalog::{DeviceCatalog, SelectionChange};
use crate::session::composer::{compose, JobForm};
use crate::session::connection::{Connection, ConnectionState, Connector, LinkEnvelope, LinkEvent};
use crate::session::error::{SubmitError, VerificationError};
use crate::session::progress::ProgressState;
use crate::session::protocol::{format_size, Device, InboundMessage, JobAction, JobRequest};
use crate::session::verifier::{
    Completion, DeviceInfo, DeviceVerifier, VerificationOutcome, VerificationSpawner,
};
use tracing::{debug, info, warn};

pub struct Console {
    connection: Connection,
    catalog: DeviceCatalog,
    form: JobForm,
    progress: ProgressState,
    verifier: DeviceVerifier,
    activity: ActivityLog,
    status: String,
    last_job: Option<JobRequest>,
    connector: Box<dyn Connector>,
    spawner: Box<dyn VerificationSpawner>,
}

impl Console {
    pub fn new(
        form: JobForm,
        connector: Box<dyn Connector>,
        spawner: Box<dyn VerificationSpawner>,
    ) -> Self {
        let connection = Connection::new();
        let status = connection.status().to_string();
        Self {
            connection,
            catalog: DeviceCatalog::new(),
            form,
            progress: ProgressState::new(),
            verifier: DeviceVerifier::new(),
            activity: ActivityLog::new(),
            status,
            last_job: None,
            connector,
            spawner,
        }
    }

    // ── Connection ──────────────────────────────────────────────────────

    /// Open a new session, replacing any previous link. Devices, verification
    /// results and progress belong to the old session and are dropped; the
    /// job form is kept.
    pub fn connect(&mut self) {
        let generation = self.connection.connect(self.connector.as_ref());
        self.catalog = DeviceCatalog::new();
        self.verifier.begin(None);
        self.progress = ProgressState::new();
        self.last_job = None;
        self.status = self.connection.status().to_string();
        self.activity
            .info(format!("Connecting to companion (attempt {})", generation));
    }

    /// Dispose the live link, e.g. when the console exits.
    pub fn shutdown(&mut self) {
        self.connection.dispose();
    }

    pub fn handle_link_event(&mut self, envelope: LinkEnvelope) {
        if !self.connection.is_current(envelope.generation) {
            debug!(
                generation = envelope.generation,
                current = self.connection.generation(),
                "ignoring event from a disposed link"
            );
            return;
        }

        match envelope.event {
            LinkEvent::Opened => {
                self.connection.mark_open();
                self.status = self.connection.status().to_string();
                self.activity.info(self.status.clone());
            }
            LinkEvent::Text(text) => self.handle_text(&text),
            LinkEvent::Errored(reason) => {
                self.connection.mark_errored(&reason);
                self.status = self.connection.status().to_string();
                self.activity.error(self.status.clone());
            }
            LinkEvent::Closed => {
                let before = self.connection.state();
                self.connection.mark_closed();
                if self.connection.state() != before {
                    self.status = self.connection.status().to_string();
                    self.activity.warning(self.status.clone());
                }
            }
        }
    }

    fn handle_text(&mut self, text: &str) {
        match InboundMessage::parse(text) {
            Ok(message) if message.is_empty() => {
                debug!("companion message carried no known fields");
            }
            Ok(message) => self.apply_inbound(message),
            Err(err) => {
                warn!(error = %err, "ignoring malformed companion message");
                self.activity
                    .warning(format!("Ignored malformed message from companion: {}", err));
            }
        }
    }

    /// Route one inbound message: device snapshots to the catalog, the rest to
    /// the progress tracker.
    pub fn apply_inbound(&mut self, message: InboundMessage) {
        let previous_status = self.progress.status.clone();
        self.progress.merge(&message);

        if let Some(status) = &message.status {
            if *status != previous_status {
                self.activity.info(format!("Companion: {}", status));
            }
            self.status.clone_from(status);
        }

        if let Some(devices) = message.devices {
            let count = devices.len();
            let change = self.catalog.replace(devices);
            info!(count, "device snapshot received");
            self.activity.info(match count {
                0 => "No USB devices detected".to_string(),
                1 => "1 USB device detected".to_string(),
                n => format!("{} USB devices detected", n),
            });
            self.on_selection_change(change);
        }
    }

    // ── Device selection ────────────────────────────────────────────────

    pub fn select_device(&mut self, id: &str) {
        let change = self.catalog.select(id);
        self.on_selection_change(change);
    }

    pub fn select_next_device(&mut self) {
        let change = self.catalog.select_next();
        self.on_selection_change(change);
    }

    pub fn select_previous_device(&mut self) {
        let change = self.catalog.select_previous();
        self.on_selection_change(change);
    }

    fn on_selection_change(&mut self, change: SelectionChange) {
        let SelectionChange::Changed(selected) = change else {
            return;
        };
        if let Some(ticket) = self.verifier.begin(selected.as_deref()) {
            debug!(device = ticket.device_id(), seq = ticket.seq(), "verifying device");
            self.spawner.spawn(ticket);
        }
    }

    pub fn complete_verification(&mut self, outcome: VerificationOutcome) {
        let device = outcome.ticket.device_id().to_string();
        match self.verifier.complete(outcome) {
            Completion::Applied => {
                if let Some(info) = self.verifier.info() {
                    self.activity.info(format!(
                        "Verified {} ({})",
                        info.path,
                        format_size(info.size)
                    ));
                    if info.mounted {
                        self.activity.warning(format!(
                            "{} is mounted at {}; unmount it before writing",
                            info.path,
                            info.mount_points.join(", ")
                        ));
                    }
                }
            }
            Completion::Failed(err) => {
                self.activity
                    .warning(format!("Verification of {} failed: {}", device, err));
            }
            Completion::Stale => {}
        }
    }

    // ── Form ────────────────────────────────────────────────────────────

    pub fn set_image(&mut self, image: Option<String>) {
        self.form.set_image(image);
        if let Some(image) = self.form.image() {
            self.activity.info(format!("Image selected: {}", image));
        }
    }

    pub fn cycle_filesystem(&mut self) {
        self.form.cycle_filesystem();
    }

    pub fn cycle_scheme(&mut self) {
        self.form.cycle_scheme();
    }

    // ── Submission ──────────────────────────────────────────────────────

    fn check(&self, action: JobAction) -> Result<JobRequest, SubmitError> {
        let job = compose(
            action,
            self.connection.state(),
            &self.form,
            self.catalog.selected_id(),
        )?;
        if self.verifier.is_verifying() {
            return Err(SubmitError::VerificationPending);
        }
        Ok(job)
    }

    /// Run every check [`submit`](Self::submit) would, without sending.
    /// Failures are reported on the status line.
    pub fn preflight(&mut self, action: JobAction) -> Result<(), SubmitError> {
        match self.check(action) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.status = err.to_string();
                Err(err)
            }
        }
    }

    /// Compose, validate and send a job. On success progress is reset to 0
    /// and the status line announces the job before the companion answers.
    pub fn submit(&mut self, action: JobAction) -> Result<(), SubmitError> {
        let job = match self.check(action) {
            Ok(job) => job,
            Err(err) => {
                self.status = err.to_string();
                return Err(err);
            }
        };

        let payload = match job.to_json() {
            Ok(payload) => payload,
            Err(err) => {
                let err = SubmitError::Encode(err.to_string());
                self.status = err.to_string();
                return Err(err);
            }
        };

        if !self.connection.send(payload) {
            self.status = self.connection.status().to_string();
            self.activity.error(format!(
                "Failed to submit {} for {}: {}",
                action,
                job.device(),
                self.status
            ));
            return Err(SubmitError::NotDelivered);
        }

        info!(%action, device = job.device(), iso = ?job.iso(), "job submitted");
        let status = format!("Starting {}...", action);
        self.progress.reset_for_job(status.clone());
        self.status = status;
        self.activity
            .info(format!("Submitted {} for {}", action, job.device()));
        self.last_job = Some(job);
        Ok(())
    }

    // ── Read-only views ─────────────────────────────────────────────────

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn devices(&self) -> &[Device] {
        self.catalog.devices()
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.catalog.selected_device()
    }

    pub fn form(&self) -> &JobForm {
        &self.form
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.verifier.info()
    }

    pub fn verification_failure(&self) -> Option<&VerificationError> {
        self.verifier.failure()
    }

    pub fn is_verifying(&self) -> bool {
        self.verifier.is_verifying()
    }

    /// Whether create/restore are currently enabled.
    pub fn actions_enabled(&self) -> bool {
        self.connection.is_open() && !self.verifier.is_verifying()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn last_job(&self) -> Option<&JobRequest> {
        self.last_job.as_ref()
    }
}
