//! Tests for dispatch configuration.

use provena_error::ProvenaErrorKind;
use provena_exec::{Backend, BatchConfig, BatchFailurePolicy, ExecConfig};
use std::str::FromStr;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults_wait_indefinitely_and_discard() {
    let config = ExecConfig::default();

    assert_eq!(config.poll_interval(), Duration::from_secs(1));
    assert_eq!(config.poll_timeout(), None);
    assert_eq!(*config.batch().on_failure(), BatchFailurePolicy::Discard);
    assert_eq!(config.batch().submit_command()[0], "bsub");
    assert!(config.validate().is_ok());
}

#[test]
fn test_file_overrides_bundled_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("provena.toml");
    std::fs::write(
        &path,
        r#"
poll_interval_ms = 250
poll_timeout_secs = 30

[batch]
submit_command = ["qsub", "-sync", "y", "-wd", "{cwd}", "-b", "y", "{command}"]
on_failure = "propagate"
"#,
    )
    .unwrap();

    let config = ExecConfig::from_file(&path).unwrap();
    assert_eq!(config.poll_interval(), Duration::from_millis(250));
    assert_eq!(config.poll_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.batch().submit_command()[0], "qsub");
    assert_eq!(*config.batch().on_failure(), BatchFailurePolicy::Propagate);
}

#[test]
fn test_partial_file_keeps_remaining_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("provena.toml");
    std::fs::write(&path, "poll_interval_ms = 5\n").unwrap();

    let config = ExecConfig::from_file(&path).unwrap();
    assert_eq!(*config.poll_interval_ms(), 5);
    assert_eq!(config.batch(), ExecConfig::default().batch());
}

#[test]
fn test_submit_command_without_placeholder_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("provena.toml");
    std::fs::write(&path, "[batch]\nsubmit_command = [\"bsub\", \"-K\"]\n").unwrap();

    let err = ExecConfig::from_file(&path).unwrap_err();
    assert!(matches!(err.kind(), ProvenaErrorKind::Config(_)));
    assert!(err.to_string().contains("{command}"));
}

#[test]
fn test_validate_rejects_zero_interval_and_empty_command() {
    let zero = ExecConfig::default().with_poll_interval_ms(0);
    assert!(zero.validate().is_err());

    let empty = ExecConfig::default()
        .with_batch(BatchConfig::default().with_submit_command(Vec::<String>::new()));
    assert!(empty.validate().is_err());
}

#[test]
fn test_unknown_policy_fails_to_parse() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("provena.toml");
    std::fs::write(&path, "[batch]\non_failure = \"ignore\"\n").unwrap();

    assert!(ExecConfig::from_file(&path).is_err());
}

#[test]
fn test_backend_and_policy_names() {
    assert_eq!(Backend::from_str("batch").unwrap(), Backend::Batch);
    assert_eq!(Backend::from_str("threaded").unwrap(), Backend::Threaded);
    assert!(Backend::from_str("cluster").is_err());
    assert_eq!(Backend::default().to_string(), "threaded");
    assert_eq!(BatchFailurePolicy::Propagate.to_string(), "propagate");
}
