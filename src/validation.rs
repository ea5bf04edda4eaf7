//! Checks a requested property value against known monitor state.
//!
//! Continuous properties clamp into their range, enumerated properties
//! only accept one of their choices. Relative changes need the current
//! value and are therefore impossible without a cached monitor.

use tracing::{debug, warn};

use crate::error::{BackendError, Result};
use crate::monitor::{AdapterKind, Monitor, Property, PropertyValue};

/// Reject relative changes of properties that have no order.
///
/// Checked before any cache lookup, so `increment power_mode` fails the
/// same way with or without a detect cache.
pub fn ensure_incrementable(property: Property, increase_by_value: bool) -> Result<()> {
    if increase_by_value && !property.is_continuous() {
        return Err(BackendError::Argument(format!(
            "Cannot increase non-continuous property `{property}`"
        )));
    }
    Ok(())
}

/// Clamp `value` into `[min, max]`.
pub fn clamp(value: i64, min: i64, max: i64) -> i64 {
    value.max(min).min(max)
}

/// Final value to write to `property` of `monitor`.
///
/// With `increase_by_value`, `requested` is a delta added to the current
/// value. Enumerated properties reject deltas and values outside their
/// choices.
pub fn ensure_valid(
    monitor: &Monitor,
    property: Property,
    requested: i64,
    increase_by_value: bool,
) -> Result<i64> {
    let current = monitor
        .property(property)
        .ok_or_else(|| BackendError::UnsupportedProperty {
            adapter: monitor.adapter.to_string(),
            id: monitor.id,
            property: property.to_string(),
        })?;

    match current {
        PropertyValue::Enumerated { choices, .. } => {
            if increase_by_value {
                return Err(BackendError::Argument(format!(
                    "Cannot increase non-continuous property `{property}`"
                )));
            }
            if choices.contains(&requested) {
                Ok(requested)
            } else {
                Err(BackendError::IllegalValue {
                    adapter: monitor.adapter.to_string(),
                    id: monitor.id,
                    property: property.to_string(),
                    value: requested,
                    kind: "non-continuous",
                })
            }
        }
        PropertyValue::Continuous {
            value,
            min_value,
            max_value,
        } => {
            let target = if increase_by_value {
                value.saturating_add(requested)
            } else {
                requested
            };
            let clamped = clamp(target, *min_value, *max_value);
            if clamped != target {
                debug!(
                    adapter = %monitor.adapter,
                    id = monitor.id,
                    %property,
                    target,
                    clamped,
                    "Clamped value into range"
                );
            }
            Ok(clamped)
        }
    }
}

/// Validate against `cached` when available.
///
/// Without a cached monitor an absolute value passes through unchecked,
/// while a relative change fails with [`BackendError::MissingCache`].
pub fn resolve_value(
    cached: Option<&Monitor>,
    adapter: AdapterKind,
    id: u32,
    property: Property,
    requested: i64,
    increase_by_value: bool,
) -> Result<i64> {
    match cached {
        Some(monitor) => ensure_valid(monitor, property, requested, increase_by_value),
        None if increase_by_value => Err(BackendError::MissingCache(format!(
            "Monitor `{adapter}.{id}` is not cached; its current {property} is unknown"
        ))),
        None => {
            warn!(
                %adapter,
                id,
                %property,
                requested,
                "Monitor is not cached, setting value without validation"
            );
            Ok(requested)
        }
    }
}
