//! Detect and write commands against the fake ddcutil.

use std::fs;

use serde_json::{Value, json};

use crate::common::fixtures::FakeDdcutil;

/// Fake with a detect cache already written.
fn detected() -> FakeDdcutil {
    let fake = FakeDdcutil::new();
    fake.cli().run(&["detect", "ddcci"]).assert_success();
    fake
}

#[test]
fn test_detect_reports_and_caches_monitors() {
    let fake = FakeDdcutil::new();
    fake.cli()
        .run(&["detect", "ddcci"])
        .assert_success()
        .assert_single_line()
        .assert_json_field("/command", &json!("detect"))
        .assert_json_field("/response/ddcci/4/name", &json!("DELL S2721DGF"))
        .assert_json_field("/response/ddcci/4/ddcutil_id", &json!(1))
        .assert_json_field(
            "/response/ddcci/4/property_values/power_mode",
            &json!({"value": 1, "choices": [1, 4, 5]}),
        )
        .assert_json_field("/response/ddcci/7/name", &json!("Unknown monitor"))
        .assert_json_field_missing("/response/ddcci/5")
        .assert_json_field_missing("/response/ddcci/10");

    let cache: Value =
        serde_json::from_str(&fs::read_to_string(fake.cache_path()).unwrap()).unwrap();
    assert_eq!(
        cache["data"]["ddcci"]["7"]["property_values"]["brightness"]["value"],
        json!(90)
    );
    assert!(fake.setvcp_calls().is_empty());
}

#[test]
fn test_detect_with_broken_ddcutil_fails() {
    let fake = FakeDdcutil::new();
    let missing = fake.dir.path().join("missing.sh");
    fs::write(
        fake.config_path(),
        format!("[ddcci]\nddcutil_executable = \"sh {}\"\n", missing.display()),
    )
    .unwrap();

    fake.cli()
        .run(&["detect", "ddcci"])
        .assert_exit_code(1)
        .assert_single_line()
        .assert_json_field("/command", &json!("detect"))
        .assert_error_type("DdcutilError");
    assert!(!fake.cache_path().exists());
}

#[test]
fn test_set_without_cache_writes_value_unchecked() {
    let fake = FakeDdcutil::new();
    fake.cli()
        .run(&["set", "ddcci", "4", "brightness", "30"])
        .assert_success()
        .assert_json_field("/command", &json!("set"))
        .assert_json_field(
            "/response",
            &json!({"adapter": "ddcci", "id": 4, "property": "brightness", "value": 30}),
        );
    assert_eq!(fake.setvcp_calls(), vec!["--bus 4 setvcp 0x10 30"]);
}

#[test]
fn test_increment_without_cache_fails() {
    let fake = FakeDdcutil::new();
    fake.cli()
        .run(&["increment", "ddcci", "4", "brightness", "10"])
        .assert_exit_code(1)
        .assert_json_field("/command", &json!("increment"))
        .assert_error_type("MissingCacheError");
    assert!(fake.setvcp_calls().is_empty());
}

#[test]
fn test_increment_clamps_against_cached_value() {
    let fake = detected();
    fake.cli()
        .run(&["increment", "ddcci", "4", "brightness", "-70"])
        .assert_success()
        .assert_json_field("/response/value", &json!(0));
    fake.cli()
        .run(&["increment", "ddcci", "4", "brightness", "15"])
        .assert_success()
        .assert_json_field("/response/value", &json!(15));

    assert_eq!(
        fake.setvcp_calls(),
        vec!["--bus 4 setvcp 0x10 0", "--bus 4 setvcp 0x10 15"]
    );
}

#[test]
fn test_set_rejects_unadvertised_power_mode() {
    let fake = detected();
    fake.cli()
        .run(&["set", "ddcci", "4", "power_mode", "2"])
        .assert_exit_code(1)
        .assert_error_type("IllegalPropertyValueError")
        .assert_json_field_exists("/error/suggestion");
    fake.cli()
        .run(&["set", "ddcci", "7", "contrast", "20"])
        .assert_exit_code(1)
        .assert_error_type("UnsupportedPropertyError");
    assert!(fake.setvcp_calls().is_empty());
}

#[test]
fn test_failed_write_is_reported() {
    let fake = detected();
    fake.cli()
        .run(&["set", "ddcci", "7", "brightness", "20"])
        .assert_exit_code(1)
        .assert_error_type("DdcutilError");
}

#[test]
fn test_set_all_reports_partial_failure() {
    let fake = detected();
    fake.cli()
        .run(&["set-all", "brightness", "60"])
        .assert_success()
        .assert_json_field("/command", &json!("set-all"))
        .assert_json_field(
            "/response/results/0",
            &json!({"adapter": "ddcci", "id": 4, "ok": true, "value": 60}),
        )
        .assert_json_field("/response/results/1/ok", &json!(false))
        .assert_json_field(
            "/response/summary",
            &json!({"total": 2, "success": 1, "failed": 1}),
        );
    assert_eq!(fake.setvcp_calls(), vec!["--bus 4 setvcp 0x10 60"]);
}

#[test]
fn test_set_all_fails_when_every_monitor_fails() {
    let fake = detected();
    fake.cli()
        .run(&["set-all", "power_mode", "3"])
        .assert_exit_code(1)
        .assert_single_line()
        .assert_json_field("/command", &json!("set-all"))
        .assert_error_type("BatchFailedError")
        .assert_stdout_contains("ddcci.4")
        .assert_stdout_contains("ddcci.7");
    assert!(fake.setvcp_calls().is_empty());
}

#[test]
fn test_power_mode_cannot_be_incremented() {
    let fake = FakeDdcutil::new();
    fake.cli()
        .run(&["increment", "ddcci", "4", "power_mode", "1"])
        .assert_exit_code(1)
        .assert_error_type("IllegalArgumentError");

    fake.cli().run(&["detect", "ddcci"]).assert_success();
    fake.cli()
        .run(&["increment-all", "power_mode", "1"])
        .assert_exit_code(1)
        .assert_json_field("/command", &json!("increment-all"))
        .assert_error_type("IllegalArgumentError");
    assert!(fake.setvcp_calls().is_empty());
}

#[test]
fn test_increment_all_uses_cached_values() {
    let fake = detected();
    fake.cli()
        .run(&["increment-all", "contrast", "-5"])
        .assert_success()
        .assert_json_field("/response/results/0/value", &json!(70))
        .assert_json_field("/response/summary/success", &json!(1));
    assert_eq!(fake.setvcp_calls(), vec!["--bus 4 setvcp 0x12 70"]);
}

#[test]
fn test_no_verify_flag_reaches_ddcutil() {
    let fake = FakeDdcutil::new();
    fake.write_config("ddcutil_no_verify = true\nddcutil_sleep_multiplier = 0.5\n");
    fake.cli()
        .run(&["set", "ddcci", "4", "contrast", "40"])
        .assert_success();
    assert_eq!(
        fake.setvcp_calls(),
        vec!["--bus 4 --sleep-multiplier 0.5 setvcp --noverify 0x12 40"]
    );
}

#[test]
fn test_debug_logging_goes_to_stderr_and_file() {
    let fake = FakeDdcutil::new();
    let log = fake.dir.path().join("backend.log");
    let log_arg = log.display().to_string();
    fake.cli()
        .run(&["--debug", "--debug-log", &log_arg, "detect", "ddcci"])
        .assert_success()
        .assert_single_line()
        .assert_stderr_contains("Detect connected DDC/CI monitors")
        .assert_stderr_contains("Duplicate monitor found");

    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("Wrote detect cache"));
}
