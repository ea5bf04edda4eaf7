//! Detection against scripted ddcutil output.

use std::sync::Arc;

use ddcci::adapters::Orchestrator;
use ddcci::cache::CacheStore;
use ddcci::config::Config;
use ddcci::monitor::{AdapterKind, Property, PropertyValue};
use ddcci::output::JsonOutput;
use ddcci::process::mock::{MockRunner, Reply};
use serde_json::json;
use tempfile::TempDir;

use crate::common::fixtures::{DETECT_OUTPUT, scripted_runner};
use crate::common::init_test_logging;

#[tokio::test]
async fn test_detect_keeps_distinct_working_monitors() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let config = Config::default();
    let mut cache = CacheStore::load(dir.path().join("detect.json"));

    let summary = Orchestrator::new(&config, scripted_runner(), &mut cache)
        .detect(&[AdapterKind::Ddcci])
        .await
        .unwrap();

    let monitors = &summary[&AdapterKind::Ddcci];
    assert_eq!(monitors.keys().copied().collect::<Vec<_>>(), vec![4, 7]);

    let dell = &monitors[&4];
    assert_eq!(dell.name, "DELL S2721DGF");
    assert_eq!(dell.ddcutil_id, Some(1));
    assert_eq!(
        dell.property(Property::Brightness),
        Some(&PropertyValue::Continuous {
            value: 50,
            min_value: 0,
            max_value: 100,
        })
    );
    assert_eq!(dell.property(Property::Contrast).map(PropertyValue::value), Some(75));
    assert_eq!(
        dell.property(Property::PowerMode),
        Some(&PropertyValue::Enumerated {
            value: 1,
            choices: vec![1, 4, 5],
        })
    );

    let unnamed = &monitors[&7];
    assert_eq!(unnamed.name, "Unknown monitor");
    assert_eq!(unnamed.ddcutil_id, Some(3));
    assert_eq!(unnamed.property_values.len(), 1);
    assert!(unnamed.property(Property::Contrast).is_none());
}

#[tokio::test]
async fn test_detect_never_queries_skipped_buses() {
    let dir = TempDir::new().unwrap();
    let config = Config::default();
    let runner = scripted_runner();
    let mut cache = CacheStore::load(dir.path().join("detect.json"));

    Orchestrator::new(&config, Arc::clone(&runner), &mut cache)
        .detect(&[AdapterKind::Ddcci])
        .await
        .unwrap();

    assert_eq!(runner.call_count("detect"), 1);
    assert_eq!(runner.call_count("--bus 5"), 0);
    assert_eq!(runner.call_count("--bus 10"), 0);
    assert_eq!(runner.call_count("capabilities"), 2);
}

#[tokio::test]
async fn test_detect_drops_monitor_with_failing_queries() {
    let dir = TempDir::new().unwrap();
    let config = Config::default();
    let runner = Arc::new(
        MockRunner::new()
            .on("--version", "ddcutil 2.1.4")
            .on("detect", DETECT_OUTPUT)
            .on("--bus 4 capabilities", "vcp(10)")
            .on("--bus 4 getvcp --brief 0x10", "VCP 10 C 30 100")
            .on_failure("--bus 7 capabilities", 1, "No monitor detected on bus"),
    );
    let mut cache = CacheStore::load(dir.path().join("detect.json"));

    let summary = Orchestrator::new(&config, runner, &mut cache)
        .detect(&[AdapterKind::Ddcci])
        .await
        .unwrap();

    let monitors = &summary[&AdapterKind::Ddcci];
    assert_eq!(monitors.len(), 1);
    assert!(monitors.contains_key(&4));
}

#[tokio::test]
async fn test_detect_retries_communication_failures() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.ddcci.brute_force_attempts = 2;
    let runner = Arc::new(
        MockRunner::new()
            .on("--version", "ddcutil 2.1.4")
            .on("detect", DETECT_OUTPUT)
            .on("--bus 4 capabilities", "vcp(10)")
            .on_sequence(
                "--bus 4 getvcp --brief 0x10",
                vec![
                    Reply::stdout("DDC communication failed for /dev/i2c-4"),
                    Reply::stdout("VCP 10 C 42 100"),
                ],
            )
            .on("--bus 7 capabilities", "vcp(10)")
            .on("--bus 7 getvcp --brief 0x10", "VCP 10 C 90 100"),
    );
    let mut cache = CacheStore::load(dir.path().join("detect.json"));

    let summary = Orchestrator::new(&config, Arc::clone(&runner), &mut cache)
        .detect(&[AdapterKind::Ddcci])
        .await
        .unwrap();

    let brightness = summary[&AdapterKind::Ddcci][&4]
        .property(Property::Brightness)
        .map(PropertyValue::value);
    assert_eq!(brightness, Some(42));
    assert_eq!(runner.call_count("--bus 4 getvcp --brief 0x10"), 2);
}

#[tokio::test]
async fn test_detect_fails_when_ddcutil_is_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("detect.json");
    let config = Config::default();
    let mut cache = CacheStore::load(&path);

    let result = Orchestrator::new(&config, Arc::new(MockRunner::new()), &mut cache)
        .detect(&[AdapterKind::Ddcci])
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), "DdcutilError");
    assert!(!path.exists());
}

#[tokio::test]
async fn test_detect_cache_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("detect.json");
    let config = Config::default();
    let mut cache = CacheStore::load(&path);

    let summary = Orchestrator::new(&config, scripted_runner(), &mut cache)
        .detect(&[AdapterKind::Ddcci])
        .await
        .unwrap();

    let reloaded = CacheStore::load(&path);
    assert!(reloaded.is_loaded());
    assert_eq!(reloaded.summary(), Some(&summary));

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["data"]["ddcci"]["4"]["id"], json!(4));
}

#[tokio::test]
async fn test_detect_response_shape() {
    let dir = TempDir::new().unwrap();
    let config = Config::default();
    let mut cache = CacheStore::load(dir.path().join("detect.json"));

    let summary = Orchestrator::new(&config, scripted_runner(), &mut cache)
        .detect(&[AdapterKind::Ddcci])
        .await
        .unwrap();
    let value = JsonOutput::response_value("detect", &summary);

    assert_eq!(value["command"], json!("detect"));
    let dell = &value["response"]["ddcci"]["4"];
    assert_eq!(dell["adapter"], json!("ddcci"));
    assert_eq!(
        dell["property_values"]["brightness"],
        json!({"value": 50, "min_value": 0, "max_value": 100})
    );
    assert_eq!(
        dell["property_values"]["power_mode"],
        json!({"value": 1, "choices": [1, 4, 5]})
    );
    assert_eq!(dell["vcp_capabilities"]["D6"], json!([1, 4, 5]));
    assert_eq!(dell["vcp_capabilities"]["10"], json!(null));
}
