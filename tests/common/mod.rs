//! Common test utilities for the backend.
//!
//! - `cli`: Binary runner with fluent assertions on the JSON result
//! - `fixtures`: Canned ddcutil output, scripted runners and a fake ddcutil
#![allow(dead_code)]


use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
