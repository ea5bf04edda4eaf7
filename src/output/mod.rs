//! Result types printed by the CLI and the JSON writer for them.

use serde::Serialize;

use crate::monitor::{AdapterKind, Property};

mod json;

pub use json::JsonOutput;

/// Response of `set` and `increment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetResponse {
    pub adapter: AdapterKind,
    pub id: u32,
    pub property: Property,
    /// Value actually written after validation and clamping.
    pub value: i64,
}

/// Outcome for one monitor of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorResult {
    pub adapter: AdapterKind,
    pub id: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MonitorResult {
    pub const fn success(adapter: AdapterKind, id: u32, value: i64) -> Self {
        Self {
            adapter,
            id,
            ok: true,
            value: Some(value),
            error: None,
        }
    }

    pub fn failure(adapter: AdapterKind, id: u32, error: &str) -> Self {
        Self {
            adapter,
            id,
            ok: false,
            value: None,
            error: Some(error.to_string()),
        }
    }
}

/// Summary statistics for a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[MonitorResult]) -> Self {
        let success = results.iter().filter(|result| result.ok).count();
        Self {
            total: results.len(),
            success,
            failed: results.len() - success,
        }
    }

    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// At least one monitor was targeted and none of them succeeded.
    pub const fn all_failed(&self) -> bool {
        self.total > 0 && self.success == 0
    }
}

/// Response of `set-all` and `increment-all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub results: Vec<MonitorResult>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(results: Vec<MonitorResult>) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self { results, summary }
    }

    /// `adapter.id: error` for every failed monitor, joined with `; `.
    pub fn failure_reasons(&self) -> String {
        self.results
            .iter()
            .filter_map(|result| {
                result
                    .error
                    .as_deref()
                    .map(|error| format!("{}.{}: {error}", result.adapter, result.id))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
