//! Commands that never talk to a monitor.

use std::fs;

use serde_json::{Value, json};

use crate::common::fixtures::FakeDdcutil;

#[test]
fn test_version_prints_one_json_line() {
    let fake = FakeDdcutil::new();
    fake.cli()
        .run(&["version"])
        .assert_success()
        .assert_single_line()
        .assert_stderr_is_empty()
        .assert_json_field("/command", &json!("version"))
        .assert_json_field("/response", &json!(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_pretty_output_spans_lines() {
    let fake = FakeDdcutil::new();
    let result = fake.cli().run(&["--pretty", "version"]);
    result
        .assert_success()
        .assert_json_field("/command", &json!("version"));
    assert!(result.stdout.trim_end().lines().count() > 1);

    fake.cli()
        .with_env("DDCCI_BACKEND_PRETTY", "true")
        .run(&["version"])
        .assert_success()
        .assert_stdout_contains("\n  \"command\"");
}

#[test]
fn test_unknown_command_is_rejected() {
    let fake = FakeDdcutil::new();
    fake.cli()
        .run(&["calibrate"])
        .assert_failure()
        .assert_exit_code(2);
}

#[test]
fn test_config_get_reads_file() {
    let fake = FakeDdcutil::new();
    let expected = format!("sh {}", fake.script_path().display());
    fake.cli()
        .run(&["config", "ddcci.ddcutil_executable"])
        .assert_success()
        .assert_json_field("/command", &json!("config"))
        .assert_json_field("/response", &Value::from(expected));
}

#[test]
fn test_config_get_falls_back_to_defaults() {
    let fake = FakeDdcutil::new();
    fs::remove_file(fake.config_path()).unwrap();
    fake.cli()
        .run(&["config", "ddcci.ddcutil_sleep_multiplier"])
        .assert_success()
        .assert_json_field("/response", &json!("1"));
    fake.cli()
        .run(&["config", "ddcci.ddcutil_executable"])
        .assert_success()
        .assert_json_field("/response", &json!("ddcutil"));
}

#[test]
fn test_config_set_persists_normalized_value() {
    let fake = FakeDdcutil::new();
    fake.cli()
        .run(&["config", "ddcci.ddcutil_no_verify", "yes"])
        .assert_success()
        .assert_json_field("/response", &json!("true"));
    fake.cli()
        .run(&["config", "ddcci.brute_force_attempts", "3"])
        .assert_success()
        .assert_json_field("/response", &json!("3"));

    let contents = fs::read_to_string(fake.config_path()).unwrap();
    assert!(contents.contains("ddcutil_no_verify = true"));
    assert!(contents.contains("brute_force_attempts = 3"));
    assert!(contents.contains(&fake.script_path().display().to_string()));

    fake.cli()
        .run(&["config", "ddcci.brute_force_attempts"])
        .assert_success()
        .assert_json_field("/response", &json!("3"));
}

#[test]
fn test_config_errors_are_reported_as_json() {
    let fake = FakeDdcutil::new();
    let before = fs::read_to_string(fake.config_path()).unwrap();

    fake.cli()
        .run(&["config", "ddcci.brute_force_attempts", "-1"])
        .assert_exit_code(1)
        .assert_single_line()
        .assert_json_field("/command", &json!("config"))
        .assert_error_type("ConfigurationError")
        .assert_json_field_exists("/error/message");
    fake.cli()
        .run(&["config", "ddcci.colour"])
        .assert_exit_code(1)
        .assert_error_type("ConfigurationError");
    fake.cli()
        .run(&["config", "brute_force_attempts"])
        .assert_exit_code(1)
        .assert_error_type("ConfigurationError");

    assert_eq!(fs::read_to_string(fake.config_path()).unwrap(), before);
}
