//! Console flow tests
//!
//! Drives a [`Console`] through whole operator sessions with a recording
//! transport: connection, device snapshots, verification, job submission and
//! pushed progress.

use webboot::session::connection::{STATUS_CONNECTED, STATUS_NOT_CONNECTED};
use webboot::session::testing::{RecordingConnector, RecordingSpawner};
use webboot::session::{
    ComposeError, ConnectionState, Console, DeviceInfo, JobAction, JobForm, LinkEnvelope,
    LinkEvent, SubmitError, VerificationOutcome,
};

struct Harness {
    console: Console,
    connector: RecordingConnector,
    spawner: RecordingSpawner,
}

impl Harness {
    fn new() -> Self {
        let connector = RecordingConnector::new();
        let spawner = RecordingSpawner::new();
        let console = Console::new(
            JobForm::default(),
            Box::new(connector.clone()),
            Box::new(spawner.clone()),
        );
        Self {
            console,
            connector,
            spawner,
        }
    }

    fn emit(&mut self, event: LinkEvent) {
        let generation = self.console.connection().generation();
        self.console
            .handle_link_event(LinkEnvelope::new(generation, event));
    }

    fn open(&mut self) {
        self.console.connect();
        self.emit(LinkEvent::Opened);
    }

    fn push(&mut self, json: &str) {
        self.emit(LinkEvent::Text(json.to_string()));
    }

    /// Finish the most recent verification successfully.
    fn verify_latest(&mut self) {
        let ticket = self
            .spawner
            .tickets()
            .pop()
            .expect("a verification was requested");
        let info = DeviceInfo {
            path: format!("/dev/{}", ticket.device_id()),
            size: 8_589_934_592,
            filesystem: Some("vfat".to_string()),
            mounted: false,
            mount_points: Vec::new(),
        };
        self.console.complete_verification(VerificationOutcome {
            ticket,
            result: Ok(info),
        });
    }
}

const KINGSTON: &str = r#"{"devices":[{"id":"sdb","name":"Kingston 8GB","size":8589934592}]}"#;

#[test]
fn test_snapshot_selects_first_device_and_verifies_it() {
    let mut h = Harness::new();
    h.open();
    h.push(KINGSTON);

    assert_eq!(h.console.catalog().selected_id(), Some("sdb"));
    assert_eq!(h.spawner.requested_devices(), vec!["sdb"]);
    assert!(h.console.is_verifying());
}

#[test]
fn test_create_without_image_sends_nothing() {
    let mut h = Harness::new();
    h.open();
    h.push(KINGSTON);
    h.verify_latest();

    let result = h.console.submit(JobAction::Create);

    assert_eq!(result, Err(SubmitError::Invalid(ComposeError::MissingImage)));
    assert_eq!(h.console.status(), "Please select an ISO image");
    assert!(h.connector.sent().is_empty());
}

#[test]
fn test_create_sends_job_and_resets_progress() {
    let mut h = Harness::new();
    h.open();
    h.push(KINGSTON);
    h.verify_latest();
    h.push(r#"{"progress":100,"current_operation":"Done"}"#);
    h.console.set_image(Some("ubuntu.iso".to_string()));

    assert_eq!(h.console.submit(JobAction::Create), Ok(()));

    assert_eq!(
        h.connector.sent(),
        vec![
            r#"{"action":"create","iso":"ubuntu.iso","filesystem":"FAT32","scheme":"MBR","device":"sdb"}"#
                .to_string()
        ]
    );
    assert_eq!(h.console.progress().percent, 0);
    assert_eq!(h.console.status(), "Starting create...");
    assert_eq!(
        h.console.last_job().map(|job| job.device()),
        Some("sdb")
    );
}

#[test]
fn test_progress_fields_accumulate() {
    let mut h = Harness::new();
    h.open();
    h.push(r#"{"progress":42}"#);
    h.push(r#"{"current_operation":"Writing image"}"#);

    let progress = h.console.progress();
    assert_eq!(progress.percent, 42);
    assert_eq!(progress.operation, "Writing image");
}

#[test]
fn test_restore_sends_null_iso() {
    let mut h = Harness::new();
    h.open();
    h.push(KINGSTON);
    h.verify_latest();
    h.console.cycle_filesystem();
    h.console.cycle_scheme();

    assert_eq!(h.console.submit(JobAction::Restore), Ok(()));
    assert_eq!(
        h.connector.sent(),
        vec![
            r#"{"action":"restore","iso":null,"filesystem":"NTFS","scheme":"GPT","device":"sdb"}"#
                .to_string()
        ]
    );
}

#[test]
fn test_missing_device_wins_over_image_for_restore() {
    let mut h = Harness::new();
    h.open();
    h.console.set_image(Some("ubuntu.iso".to_string()));

    assert_eq!(
        h.console.submit(JobAction::Restore),
        Err(SubmitError::Invalid(ComposeError::MissingDevice))
    );
}

#[test]
fn test_submit_before_open_reports_not_connected() {
    let mut h = Harness::new();
    h.console.connect();
    h.console.set_image(Some("ubuntu.iso".to_string()));

    assert_eq!(
        h.console.submit(JobAction::Create),
        Err(SubmitError::Invalid(ComposeError::NotConnected))
    );
    assert_eq!(h.console.status(), STATUS_NOT_CONNECTED);
    assert!(h.connector.sent().is_empty());
}

#[test]
fn test_failed_submit_keeps_progress() {
    let mut h = Harness::new();
    h.open();
    h.push(r#"{"progress":70,"status":"Writing..."}"#);

    assert!(h.console.submit(JobAction::Create).is_err());
    assert_eq!(h.console.progress().percent, 70);
}

#[test]
fn test_reselection_keeps_present_selection() {
    let mut h = Harness::new();
    h.open();
    h.push(r#"{"devices":[{"id":"sdb","name":"A"},{"id":"sdc","name":"B"}]}"#);
    h.console.select_device("sdc");

    h.push(r#"{"devices":[{"id":"sdc","name":"B"},{"id":"sdd","name":"C"}]}"#);
    assert_eq!(h.console.catalog().selected_id(), Some("sdc"));

    h.push(r#"{"devices":[{"id":"sdd","name":"C"}]}"#);
    assert_eq!(h.console.catalog().selected_id(), Some("sdd"));

    h.push(r#"{"devices":[]}"#);
    assert_eq!(h.console.catalog().selected_id(), None);
    assert!(!h.console.is_verifying());
}

#[test]
fn test_stale_verification_is_discarded() {
    let mut h = Harness::new();
    h.open();
    h.push(r#"{"devices":[{"id":"sdb","name":"A"},{"id":"sdc","name":"B"}]}"#);
    let stale = h.spawner.tickets().remove(0);
    h.console.select_device("sdc");

    h.console.complete_verification(VerificationOutcome {
        ticket: stale,
        result: Ok(DeviceInfo {
            path: "/dev/sdb".to_string(),
            size: 1,
            filesystem: None,
            mounted: false,
            mount_points: Vec::new(),
        }),
    });

    assert!(h.console.device_info().is_none());
    assert!(h.console.is_verifying());

    h.verify_latest();
    assert_eq!(
        h.console.device_info().map(|info| info.path.as_str()),
        Some("/dev/sdc")
    );
    assert!(h.console.actions_enabled());
}

#[test]
fn test_reconnect_replaces_link() {
    let mut h = Harness::new();
    h.open();
    h.emit(LinkEvent::Errored("connection reset".to_string()));
    assert_eq!(h.console.connection_state(), ConnectionState::Errored);
    assert!(h.console.status().contains("connection reset"));

    h.open();
    assert_eq!(h.connector.opened(), 2);
    assert_eq!(h.connector.live_links(), 1);
    assert_eq!(h.console.status(), STATUS_CONNECTED);
}

#[test]
fn test_reconnect_starts_a_fresh_session() {
    let mut h = Harness::new();
    h.open();
    h.push(KINGSTON);
    h.verify_latest();
    h.push(r#"{"progress":55,"current_operation":"iso writing"}"#);
    h.emit(LinkEvent::Errored("connection reset".to_string()));

    h.open();
    assert!(h.console.devices().is_empty());
    assert_eq!(h.console.catalog().selected_id(), None);
    assert_eq!(h.console.catalog().snapshots(), 0);
    assert!(h.console.device_info().is_none());
    assert!(!h.console.is_verifying());
    assert_eq!(h.console.progress().percent, 0);
    assert_eq!(h.console.progress().operation, "");
    assert!(h.console.last_job().is_none());

    // Nothing can be sent until the new session reports its devices.
    assert_eq!(
        h.console.submit(JobAction::Restore),
        Err(SubmitError::Invalid(ComposeError::MissingDevice))
    );
    assert!(h.connector.sent().is_empty());

    h.push(KINGSTON);
    assert_eq!(h.console.catalog().selected_id(), Some("sdb"));
    assert!(h.console.is_verifying());
}

#[test]
fn test_companion_status_reaches_status_line_and_activity() {
    let mut h = Harness::new();
    h.open();
    h.push(r#"{"status":"Formatting device..."}"#);

    assert_eq!(h.console.status(), "Formatting device...");
    assert!(h
        .console
        .activity()
        .recent()
        .any(|entry| entry.message.contains("Formatting device...")));
}
