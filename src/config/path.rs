//! Per-user file locations.
//!
//! All locations come from `dirs`, so `XDG_CONFIG_HOME`, `XDG_CACHE_HOME`
//! and friends are honoured on Linux.

use std::env;
use std::path::PathBuf;

use tracing::trace;

use crate::error::{BackendError, Result};

/// Directory name used below the config and cache roots.
pub const APP_DIR: &str = "ddcci_plasmoid";

const LOCK_FILE_STEM: &str = "ddcci_plasmoid_backend";

/// `<config-root>/ddcci_plasmoid/config.toml`
pub fn config_file() -> Result<PathBuf> {
    let root = dirs::config_dir().ok_or_else(|| {
        BackendError::Configuration("Could not determine the user config directory".to_string())
    })?;
    let path = root.join(APP_DIR).join("config.toml");
    trace!(path = %path.display(), "Resolved config file");
    Ok(path)
}

/// `<cache-root>/ddcci_plasmoid/detect.json`
pub fn cache_file() -> Result<PathBuf> {
    let root = dirs::cache_dir().ok_or_else(|| BackendError::Cache {
        path: String::new(),
        reason: "Could not determine the user cache directory".to_string(),
    })?;
    let path = root.join(APP_DIR).join("detect.json");
    trace!(path = %path.display(), "Resolved cache file");
    Ok(path)
}

/// Lock file shared by every backend process of the current user.
///
/// Lives in `XDG_RUNTIME_DIR` when set. Otherwise it goes into the temp
/// directory with the user name in the file name, since that directory is
/// shared between users.
pub fn lock_file() -> PathBuf {
    let path = match dirs::runtime_dir() {
        Some(dir) => dir.join(format!("{LOCK_FILE_STEM}.lock")),
        None => env::temp_dir().join(format!("{LOCK_FILE_STEM}-{}.lock", user_name())),
    };
    trace!(path = %path.display(), "Resolved lock file");
    path
}

fn user_name() -> String {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|var| env::var(var).ok().filter(|name| !name.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}
