//! Persistent copy of the last detection result.
//!
//! The store is loaded once per command, changed in memory and written
//! back with [`CacheStore::flush`]. Commands run under the process lock, so
//! no extra locking happens here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config;
use crate::error::Result;
use crate::monitor::{AdapterKind, DetectionSummary, Monitor, Property};

/// On-disk document: `{"data": {<adapter>: {<id>: <monitor>}}}`.
#[derive(Debug, Deserialize)]
struct CacheDocument {
    data: DetectionSummary,
}

#[derive(Serialize)]
struct CacheDocumentRef<'a> {
    data: &'a DetectionSummary,
}

/// Detection summary bound to its cache file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    summary: Option<DetectionSummary>,
}

impl CacheStore {
    /// Load the cache at `path`.
    ///
    /// A missing, unreadable or malformed file gives an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let summary = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<CacheDocument>(&text) {
                Ok(document) => {
                    debug!(path = %path.display(), "Loaded detect cache");
                    Some(document.data)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring invalid detect cache");
                    None
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Detect cache unavailable");
                None
            }
        };
        Self { path, summary }
    }

    /// Load the cache from the per-user default location.
    pub fn load_default() -> Result<Self> {
        Ok(Self::load(config::cache_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.summary.is_some()
    }

    pub const fn summary(&self) -> Option<&DetectionSummary> {
        self.summary.as_ref()
    }

    pub fn monitor(&self, adapter: AdapterKind, id: u32) -> Option<&Monitor> {
        self.summary.as_ref()?.get(&adapter)?.get(&id)
    }

    /// Swap in a fresh detection result.
    pub fn replace(&mut self, summary: DetectionSummary) {
        self.summary = Some(summary);
    }

    /// Record a successfully written value.
    ///
    /// Returns `false` when the monitor or property is not cached.
    pub fn update_value(
        &mut self,
        adapter: AdapterKind,
        id: u32,
        property: Property,
        value: i64,
    ) -> bool {
        let entry = self
            .summary
            .as_mut()
            .and_then(|summary| summary.get_mut(&adapter))
            .and_then(|monitors| monitors.get_mut(&id))
            .and_then(|monitor| monitor.property_values.get_mut(&property));
        match entry {
            Some(property_value) => {
                property_value.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Write the summary to disk, creating the cache directory if needed.
    pub fn flush(&self) -> Result<()> {
        let Some(summary) = &self.summary else {
            debug!("Nothing to flush");
            return Ok(());
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let document = CacheDocumentRef { data: summary };
        fs::write(&self.path, serde_json::to_string(&document)?)?;
        info!(path = %self.path.display(), "Wrote detect cache");
        Ok(())
    }
}
