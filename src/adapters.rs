//! Adapter dispatch and the detect/set workflows across adapters.

use futures_util::future::join_all;
use tracing::{info, instrument, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::ddcci::DdcciAdapter;
use crate::error::{BackendError, Result};
use crate::monitor::{AdapterKind, AdapterMonitors, DetectionSummary, Property};
use crate::output::{BatchReport, MonitorResult};
use crate::process::CommandRunner;
use crate::validation;

/// One of the compiled-in monitor adapters.
#[derive(Debug)]
pub enum Adapter<R> {
    Ddcci(DdcciAdapter<R>),
}

impl<R: CommandRunner> Adapter<R> {
    pub fn new(kind: AdapterKind, config: &Config, runner: R) -> Self {
        match kind {
            AdapterKind::Ddcci => Self::Ddcci(DdcciAdapter::new(&config.ddcci, runner)),
        }
    }

    pub async fn detect(&self) -> Result<AdapterMonitors> {
        match self {
            Self::Ddcci(adapter) => adapter.detect().await,
        }
    }

    pub async fn set_property(&self, id: u32, property: Property, value: i64) -> Result<()> {
        match self {
            Self::Ddcci(adapter) => adapter.set_property(id, property, value).await,
        }
    }
}

/// Runs detect and set commands against the adapters and keeps the cache
/// in step with what was written.
///
/// Every adapter is built once, when the orchestrator is created.
pub struct Orchestrator<'a, R> {
    ddcci: Adapter<R>,
    cache: &'a mut CacheStore,
}

impl<'a, R: CommandRunner> Orchestrator<'a, R> {
    pub fn new(config: &Config, runner: R, cache: &'a mut CacheStore) -> Self {
        Self {
            ddcci: Adapter::new(AdapterKind::Ddcci, config, runner),
            cache,
        }
    }

    fn adapter(&self, kind: AdapterKind) -> &Adapter<R> {
        match kind {
            AdapterKind::Ddcci => &self.ddcci,
        }
    }

    /// Detect monitors of every listed adapter concurrently and replace the
    /// cache with the merged result.
    #[instrument(skip(self))]
    pub async fn detect(&mut self, kinds: &[AdapterKind]) -> Result<DetectionSummary> {
        let mut unique = kinds.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let results = join_all(unique.into_iter().map(|kind| {
            let adapter = self.adapter(kind);
            async move { (kind, adapter.detect().await) }
        }))
        .await;

        let mut summary = DetectionSummary::new();
        for (kind, result) in results {
            summary.insert(kind, result?);
        }

        self.cache.replace(summary.clone());
        self.cache.flush()?;
        Ok(summary)
    }

    /// Set one property of one monitor and return the value written.
    #[instrument(skip(self))]
    pub async fn set(
        &mut self,
        kind: AdapterKind,
        id: u32,
        property: Property,
        value: i64,
        increase_by_value: bool,
    ) -> Result<i64> {
        validation::ensure_incrementable(property, increase_by_value)?;
        let cached = self.cache.monitor(kind, id);
        let value =
            validation::resolve_value(cached, kind, id, property, value, increase_by_value)?;

        self.adapter(kind).set_property(id, property, value).await?;

        if self.cache.update_value(kind, id, property, value) {
            self.persist();
        }
        Ok(value)
    }

    /// Set one property on every cached monitor.
    ///
    /// Monitors are written concurrently. A monitor that fails validation or
    /// the write is reported in its result and does not stop the others.
    /// When no monitor succeeds the whole command fails.
    #[instrument(skip(self))]
    pub async fn set_all(
        &mut self,
        property: Property,
        value: i64,
        increase_by_value: bool,
    ) -> Result<BatchReport> {
        validation::ensure_incrementable(property, increase_by_value)?;
        let summary = self.cache.summary().ok_or_else(|| {
            BackendError::MissingCache("set-all needs the result of a previous detect".to_string())
        })?;

        let mut results = Vec::new();
        let mut targets = Vec::new();
        for (kind, monitors) in summary {
            for (id, monitor) in monitors {
                match validation::ensure_valid(monitor, property, value, increase_by_value) {
                    Ok(target) => targets.push((*kind, *id, target)),
                    Err(e) => {
                        warn!(adapter = %kind, id, error = %e, "Skipping monitor");
                        results.push(MonitorResult::failure(*kind, *id, &e.to_string()));
                    }
                }
            }
        }

        let writes = join_all(targets.into_iter().map(|(kind, id, target)| {
            let adapter = self.adapter(kind);
            async move {
                let outcome = adapter.set_property(id, property, target).await;
                (kind, id, target, outcome)
            }
        }))
        .await;

        let mut changed = false;
        for (kind, id, target, outcome) in writes {
            match outcome {
                Ok(()) => {
                    changed |= self.cache.update_value(kind, id, property, target);
                    results.push(MonitorResult::success(kind, id, target));
                }
                Err(e) => {
                    warn!(adapter = %kind, id, error = %e, "Failed to set property");
                    results.push(MonitorResult::failure(kind, id, &e.to_string()));
                }
            }
        }
        if changed {
            self.persist();
        }

        results.sort_by_key(|result| (result.adapter, result.id));
        let report = BatchReport::new(results);
        if report.summary.is_success() {
            info!(total = report.summary.total, "Batch finished");
        } else {
            warn!(
                total = report.summary.total,
                failed = report.summary.failed,
                "Batch finished with failures"
            );
        }

        if report.summary.all_failed() {
            return Err(BackendError::BatchFailed {
                property: property.to_string(),
                total: report.summary.total,
                reason: report.failure_reasons(),
            });
        }
        Ok(report)
    }

    /// Flush the cache after writes that already reached the monitors.
    ///
    /// A failed flush only leaves the cache stale, so it is logged and the
    /// written values are still reported.
    fn persist(&self) {
        if let Err(e) = self.cache.flush() {
            warn!(
                path = %self.cache.path().display(),
                error = %e,
                "Failed to update the detect cache"
            );
        }
    }
}
