//! Keyboard event handling tests
//!
//! Tests for keyboard input handling including quit keys, image input,
//! navigation, the confirmation modal and reconnect.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use webboot::session::testing::{RecordingConnector, RecordingSpawner};
use webboot::session::{
    Console, DeviceInfo, JobAction, JobForm, LinkEnvelope, LinkEvent, VerificationOutcome,
};
use webboot::ui::app::{FocusPane, FormField, InputMode};
use webboot::ui::theme::Theme;
use webboot::ui::App;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
}

struct TestApp {
    app: App,
    connector: RecordingConnector,
    spawner: RecordingSpawner,
}

/// An app whose console is connected and sees two verified devices.
fn create_test_app() -> TestApp {
    let connector = RecordingConnector::new();
    let spawner = RecordingSpawner::new();
    let console = Console::new(
        JobForm::default(),
        Box::new(connector.clone()),
        Box::new(spawner.clone()),
    );
    let mut app = App::new(
        console,
        "ws://localhost:8080".to_string(),
        Theme::default_theme().clone(),
    );

    app.console.connect();
    let generation = app.console.connection().generation();
    app.console
        .handle_link_event(LinkEnvelope::new(generation, LinkEvent::Opened));
    app.console.handle_link_event(LinkEnvelope::new(
        generation,
        LinkEvent::Text(
            r#"{"devices":[{"id":"sdb","name":"Kingston"},{"id":"sdc","name":"SanDisk"}]}"#
                .to_string(),
        ),
    ));

    let mut test_app = TestApp {
        app,
        connector,
        spawner,
    };
    finish_verification(&mut test_app);
    test_app
}

fn finish_verification(t: &mut TestApp) {
    let ticket = t.spawner.tickets().pop().expect("verification requested");
    let path = format!("/dev/{}", ticket.device_id());
    t.app.console.complete_verification(VerificationOutcome {
        ticket,
        result: Ok(DeviceInfo {
            path,
            size: 8_000_000_000,
            filesystem: None,
            mounted: false,
            mount_points: Vec::new(),
        }),
    });
}

#[test]
fn test_quit_with_q_key() {
    let mut t = create_test_app();
    assert!(!t.app.should_quit);

    t.app.handle_key(key(KeyCode::Char('q')));
    assert!(t.app.should_quit);
}

#[test]
fn test_quit_with_ctrl_c_even_while_typing() {
    let mut t = create_test_app();
    t.app.handle_key(key(KeyCode::Char('i')));
    assert_eq!(t.app.mode, InputMode::EditingImage);

    t.app
        .handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(t.app.should_quit);
}

#[test]
fn test_help_modal_toggle() {
    let mut t = create_test_app();

    t.app.handle_key(key(KeyCode::Char('?')));
    assert_eq!(t.app.mode, InputMode::Help);

    // Any key closes help without acting on it.
    t.app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(t.app.mode, InputMode::Normal);
    assert!(!t.app.should_quit);
}

#[test]
fn test_device_navigation_wraps() {
    let mut t = create_test_app();
    assert_eq!(t.app.console.catalog().selected_id(), Some("sdb"));

    t.app.handle_key(key(KeyCode::Char('j')));
    assert_eq!(t.app.console.catalog().selected_id(), Some("sdc"));

    t.app.handle_key(key(KeyCode::Down));
    assert_eq!(t.app.console.catalog().selected_id(), Some("sdb"));

    t.app.handle_key(key(KeyCode::Up));
    assert_eq!(t.app.console.catalog().selected_id(), Some("sdc"));
    assert_eq!(t.spawner.requested_devices(), vec!["sdb", "sdc", "sdb", "sdc"]);
}

#[test]
fn test_form_navigation_and_enter() {
    let mut t = create_test_app();
    t.app.handle_key(key(KeyCode::Tab));
    assert_eq!(t.app.focus, FocusPane::Form);
    assert_eq!(t.app.form_field, FormField::Image);

    t.app.handle_key(key(KeyCode::Char('j')));
    assert_eq!(t.app.form_field, FormField::Filesystem);
    t.app.handle_key(key(KeyCode::Enter));
    assert_eq!(t.app.console.form().filesystem.label(), "NTFS");

    // Device selection is untouched while the form has focus.
    assert_eq!(t.app.console.catalog().selected_id(), Some("sdb"));
}

#[test]
fn test_image_input_accepts_iso() {
    let mut t = create_test_app();
    t.app.handle_key(key(KeyCode::Char('i')));
    type_text(&mut t.app, "ubuntu.isx");
    t.app.handle_key(key(KeyCode::Backspace));
    type_text(&mut t.app, "o");
    t.app.handle_key(key(KeyCode::Enter));

    assert_eq!(t.app.mode, InputMode::Normal);
    assert_eq!(t.app.console.form().image(), Some("ubuntu.iso"));
}

#[test]
fn test_image_input_rejects_other_files() {
    let mut t = create_test_app();
    t.app.handle_key(key(KeyCode::Char('i')));
    type_text(&mut t.app, "disk.img");
    t.app.handle_key(key(KeyCode::Enter));

    assert_eq!(t.app.mode, InputMode::EditingImage);
    assert!(t.app.input_error.is_some());
    assert_eq!(t.app.console.form().image(), None);

    t.app.handle_key(key(KeyCode::Esc));
    assert_eq!(t.app.mode, InputMode::Normal);
    assert!(t.app.input_error.is_none());
}

#[test]
fn test_create_requires_confirmation() {
    let mut t = create_test_app();
    t.app.console.set_image(Some("ubuntu.iso".to_string()));

    t.app.handle_key(key(KeyCode::Char('c')));
    assert_eq!(t.app.pending_confirmation(), Some(JobAction::Create));
    assert!(t.connector.sent().is_empty());

    t.app.handle_key(key(KeyCode::Char('y')));
    assert_eq!(t.app.mode, InputMode::Normal);
    assert_eq!(t.connector.sent().len(), 1);
    assert!(t.connector.sent()[0].contains(r#""device":"sdb""#));
}

#[test]
fn test_confirmation_can_be_cancelled() {
    let mut t = create_test_app();

    t.app.handle_key(key(KeyCode::Char('r')));
    assert_eq!(t.app.pending_confirmation(), Some(JobAction::Restore));

    t.app.handle_key(key(KeyCode::Esc));
    assert_eq!(t.app.pending_confirmation(), None);
    assert!(t.connector.sent().is_empty());
}

#[test]
fn test_invalid_job_skips_confirmation() {
    let mut t = create_test_app();

    t.app.handle_key(key(KeyCode::Char('c')));
    assert_eq!(t.app.mode, InputMode::Normal);
    assert_eq!(t.app.console.status(), "Please select an ISO image");
}

#[test]
fn test_job_blocked_while_verifying() {
    let mut t = create_test_app();
    t.app.handle_key(key(KeyCode::Char('j')));
    assert!(t.app.console.is_verifying());

    t.app.handle_key(key(KeyCode::Char('r')));
    assert_eq!(t.app.mode, InputMode::Normal);

    finish_verification(&mut t);
    t.app.handle_key(key(KeyCode::Char('r')));
    assert_eq!(t.app.pending_confirmation(), Some(JobAction::Restore));
}

#[test]
fn test_reconnect_key_opens_new_link() {
    let mut t = create_test_app();
    assert_eq!(t.connector.opened(), 1);

    t.app.handle_key(key(KeyCode::Char('R')));
    assert_eq!(t.connector.opened(), 2);
    assert_eq!(t.connector.live_links(), 1);
}
