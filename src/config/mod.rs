//! Backend configuration.
//!
//! Stored as TOML with one table per adapter:
//!
//! ```toml
//! [ddcci]
//! ddcutil_executable = "ddcutil"
//! ddcutil_sleep_multiplier = 1.0
//! ddcutil_no_verify = false
//! brute_force_attempts = 0
//! ```
//!
//! Missing files and missing keys fall back to the defaults above.

mod path;

pub use path::{APP_DIR, cache_file, config_file, lock_file};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BackendError, Result};

/// Settings of the DDC/CI adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdcciSection {
    /// Program used to talk to monitors, optionally followed by leading
    /// arguments (`"sudo ddcutil"`).
    pub ddcutil_executable: String,
    /// Passed as `--sleep-multiplier` when not 0 and not 1.
    pub ddcutil_sleep_multiplier: f64,
    /// Skip write verification on `setvcp`.
    pub ddcutil_no_verify: bool,
    /// Extra attempts when ddcutil reports a communication failure.
    pub brute_force_attempts: u32,
}

impl Default for DdcciSection {
    fn default() -> Self {
        Self {
            ddcutil_executable: "ddcutil".to_string(),
            ddcutil_sleep_multiplier: 1.0,
            ddcutil_no_verify: false,
            brute_force_attempts: 0,
        }
    }
}

impl DdcciSection {
    const KEYS: [&'static str; 4] = [
        "ddcutil_executable",
        "ddcutil_sleep_multiplier",
        "ddcutil_no_verify",
        "brute_force_attempts",
    ];

    fn get(&self, key: &str) -> Result<String> {
        match key {
            "ddcutil_executable" => Ok(self.ddcutil_executable.clone()),
            "ddcutil_sleep_multiplier" => Ok(self.ddcutil_sleep_multiplier.to_string()),
            "ddcutil_no_verify" => Ok(self.ddcutil_no_verify.to_string()),
            "brute_force_attempts" => Ok(self.brute_force_attempts.to_string()),
            _ => Err(unknown_key("ddcci", key)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<String> {
        match key {
            "ddcutil_executable" => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(BackendError::Configuration(
                        "ddcci.ddcutil_executable must not be empty".to_string(),
                    ));
                }
                self.ddcutil_executable = value.to_string();
            }
            "ddcutil_sleep_multiplier" => {
                let parsed: f64 = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| invalid_value(key, value, "a non-negative number"))?;
                self.ddcutil_sleep_multiplier = parsed;
            }
            "ddcutil_no_verify" => {
                self.ddcutil_no_verify =
                    parse_bool(value).ok_or_else(|| invalid_value(key, value, "a boolean"))?;
            }
            "brute_force_attempts" => {
                self.brute_force_attempts = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid_value(key, value, "a non-negative integer"))?;
            }
            _ => return Err(unknown_key("ddcci", key)),
        }
        self.get(key)
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ddcci: DdcciSection,
}

impl Config {
    /// Load from `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config = toml::from_str(&text).map_err(|e| {
            BackendError::Configuration(format!("Invalid config file {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    /// Load from the per-user default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&config_file()?)
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| BackendError::Configuration(format!("Could not serialize config: {e}")))?;
        fs::write(path, text)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Current value of `section.key`, rendered as text.
    pub fn get(&self, identifier: &str) -> Result<String> {
        let (section, key) = split_identifier(identifier)?;
        match section {
            "ddcci" => self.ddcci.get(key),
            _ => Err(unknown_section(section)),
        }
    }

    /// Validate and store `value` under `section.key`.
    ///
    /// Returns the normalised value as it will be written.
    pub fn set(&mut self, identifier: &str, value: &str) -> Result<String> {
        let (section, key) = split_identifier(identifier)?;
        match section {
            "ddcci" => self.ddcci.set(key, value),
            _ => Err(unknown_section(section)),
        }
    }

    /// Every `section.key` identifier the configuration understands.
    pub fn identifiers() -> impl Iterator<Item = String> {
        DdcciSection::KEYS.iter().map(|key| format!("ddcci.{key}"))
    }
}

fn split_identifier(identifier: &str) -> Result<(&str, &str)> {
    match identifier.split_once('.') {
        Some((section, key)) if !section.is_empty() && !key.is_empty() && !key.contains('.') => {
            Ok((section, key))
        }
        _ => Err(BackendError::Configuration(format!(
            "`{identifier}` is not a valid config identifier; expected section.key"
        ))),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn known_identifiers() -> String {
    Config::identifiers().collect::<Vec<_>>().join(", ")
}

fn unknown_section(section: &str) -> BackendError {
    BackendError::Configuration(format!(
        "Unknown config section `{section}`; known keys: {}",
        known_identifiers()
    ))
}

fn unknown_key(section: &str, key: &str) -> BackendError {
    BackendError::Configuration(format!(
        "Unknown config key `{section}.{key}`; known keys: {}",
        known_identifiers()
    ))
}

fn invalid_value(key: &str, value: &str, expected: &str) -> BackendError {
    BackendError::Configuration(format!(
        "Invalid value `{value}` for `{key}`: expected {expected}"
    ))
}
