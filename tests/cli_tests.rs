//! Configuration and application initialization tests

use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use webboot::session::{Filesystem, PartitionScheme};
use webboot::ui::config::{Config, DEFAULT_ENDPOINT};
use webboot::ui::theme::Theme;

/// A partial config file fills the rest from defaults
#[test]
fn test_partial_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{"theme": "Nord", "verify_timeout_secs": 3}"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.verify_timeout(), Duration::from_secs(3));
    assert_eq!(Theme::resolve(&config.theme).name, "Nord");
}

/// A malformed config file is an error rather than a silent reset
#[test]
fn test_malformed_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "{ \"endpoint\": ").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

/// Unknown filesystem names are rejected
#[test]
fn test_unknown_filesystem_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{"filesystem": "ext4"}"#).unwrap();

    assert!(Config::load_from(&path).is_err());
}

/// The command-line endpoint wins over the configured one
#[test]
fn test_endpoint_override() {
    let config = Config {
        endpoint: "ws://companion.local:8080".to_string(),
        ..Config::default()
    };

    assert_eq!(
        config.resolve_endpoint(None).unwrap(),
        "ws://companion.local:8080"
    );
    assert_eq!(
        config.resolve_endpoint(Some(" ws://127.0.0.1:9000 ")).unwrap(),
        "ws://127.0.0.1:9000"
    );
}

/// A configured endpoint with the wrong scheme is reported
#[test]
fn test_configured_endpoint_is_validated() {
    let config = Config {
        endpoint: "localhost:8080".to_string(),
        ..Config::default()
    };
    let err = config.resolve_endpoint(None).unwrap_err();
    assert!(err.to_string().contains("localhost:8080"));
}

/// Saved settings come back as the job form defaults
#[test]
fn test_saved_form_defaults_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        filesystem: Filesystem::ExFat,
        scheme: PartitionScheme::Gpt,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"exFAT\""));
    assert!(written.contains("\"GPT\""));

    let form = Config::load_from(&path).unwrap().job_form();
    assert_eq!(form.filesystem, Filesystem::ExFat);
    assert_eq!(form.scheme, PartitionScheme::Gpt);
}
