//! Interpretation of `ddcutil detect`, `capabilities` and `getvcp` output.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use futures_util::future::join_all;
use regex::Regex;
use tracing::{debug, info, warn};

use super::FeatureCode;
use super::ddcutil::DdcutilWrapper;
use super::serial::SerialIdentity;
use crate::error::{BackendError, Result};
use crate::monitor::{
    AdapterKind, AdapterMonitors, CapabilityMap, Monitor, Property, PropertyValue,
};
use crate::process::CommandRunner;
use crate::tree::Node;

/// Name used when the EDID carries no model.
pub const UNKNOWN_MONITOR: &str = "Unknown monitor";

static DISPLAY_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Display (\d+)$").expect("valid display header regex"));

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)$").expect("valid trailing number regex"));

static VCP_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"vcp\(((?:[0-9A-Fa-f\s]|\([0-9A-Fa-f\s]*\))+)\)").expect("valid vcp section regex")
});

static VCP_FEATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]+)(\([0-9A-Fa-f\s]*\))?").expect("valid vcp feature regex")
});

static HEX_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-Fa-f]+").expect("valid hex token regex"));

/// A `Display N` entry of `ddcutil detect` that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    pub ddcutil_id: u32,
    pub bus: u32,
    pub name: String,
}

/// Display number of a `Display N` header, `None` for other root entries.
pub fn display_number(node: &Node) -> Option<u32> {
    DISPLAY_HEADER
        .captures(node.key().trim())
        .and_then(|captures| captures[1].parse().ok())
}

/// Bus number from the `I2C bus` entry (`/dev/i2c-4` is bus 4).
pub fn bus_number(display: &Node) -> Result<u32> {
    let device = display.walk(&["I2C bus"])?;
    TRAILING_NUMBER
        .captures(device)
        .and_then(|captures| captures[1].parse().ok())
        .ok_or_else(|| BackendError::UnexpectedOutput {
            output: device.to_string(),
            reason: "I2C bus does not end in a bus number".to_string(),
        })
}

/// Model name from the EDID synopsis, or [`UNKNOWN_MONITOR`].
pub fn monitor_name(node: &Node) -> String {
    match node.walk(&["EDID synopsis", "Model"]) {
        Ok(model) => model.to_string(),
        Err(_) => {
            warn!(entry = node.key(), "Monitor model name unavailable");
            UNKNOWN_MONITOR.to_string()
        }
    }
}

/// Pick the usable, distinct displays out of parsed `ddcutil detect` output.
pub fn select_displays(root: &Node) -> Vec<DisplayEntry> {
    let mut seen: Vec<SerialIdentity> = Vec::new();
    let mut buses = BTreeSet::new();
    let mut displays = Vec::new();

    for node in root.children() {
        let Some(ddcutil_id) = display_number(node) else {
            warn!(
                key = node.key(),
                "Entry does not match pattern for a valid monitor, skip it"
            );
            continue;
        };

        match node.walk(&["VCP version"]) {
            Ok("Detection failed") => {
                warn!(ddcutil_id, "VCP version detection failed, skip it");
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(ddcutil_id, error = %e, "No VCP version reported, skip it");
                continue;
            }
        }

        let identity = SerialIdentity::from_node(node);
        if identity.is_duplicate(&seen) {
            warn!(ddcutil_id, ?identity, "Duplicate monitor found, skip it");
            continue;
        }

        let bus = match bus_number(node) {
            Ok(bus) => bus,
            Err(e) => {
                warn!(ddcutil_id, error = %e, "Monitor has no usable i2c bus, skip it");
                continue;
            }
        };
        if !buses.insert(bus) {
            warn!(ddcutil_id, bus, "Another monitor already uses this i2c bus, skip it");
            continue;
        }

        seen.push(identity);
        displays.push(DisplayEntry {
            ddcutil_id,
            bus,
            name: monitor_name(node),
        });
    }

    displays
}

/// Parse the `vcp(...)` section of a capabilities string.
///
/// ```text
/// vcp(02 04 10 12 14(05 08 0B 0C) 60(0F 11 12 ))
/// ```
///
/// A missing section gives an empty map.
pub fn parse_capabilities(text: &str) -> CapabilityMap {
    let Some(section) = VCP_SECTION.captures(text) else {
        debug!("No vcp section in capabilities");
        return CapabilityMap::new();
    };

    let mut capabilities = CapabilityMap::new();
    for feature in VCP_FEATURE.captures_iter(&section[1]) {
        let Ok(code) = u8::from_str_radix(&feature[1], 16) else {
            warn!(code = &feature[1], "Ignoring out of range VCP feature code");
            continue;
        };
        let values = feature.get(2).map(|group| {
            HEX_TOKEN
                .find_iter(group.as_str())
                .filter_map(|token| u8::from_str_radix(token.as_str(), 16).ok())
                .collect()
        });
        capabilities.insert(code, values);
    }
    capabilities
}

/// Current value from `getvcp --brief` output such as `VCP 10 C 50 100`
/// or `VCP D6 SNC x01`.
pub fn parse_feature_value(output: &str) -> Result<i64> {
    let unexpected = |reason: &str| BackendError::UnexpectedOutput {
        output: output.trim().to_string(),
        reason: reason.to_string(),
    };
    let token = output
        .split_whitespace()
        .nth(3)
        .ok_or_else(|| unexpected("missing value field"))?;

    let parsed = if token.starts_with(|c: char| c.is_ascii_alphabetic()) {
        let digits = token.strip_prefix(['x', 'X']).unwrap_or(token);
        i64::from_str_radix(digits, 16)
    } else {
        token.parse()
    };
    parsed.map_err(|_| unexpected("value is not a number"))
}

async fn feature_value<R: CommandRunner>(
    ddcutil: &DdcutilWrapper<R>,
    bus: u32,
    code: FeatureCode,
) -> Result<i64> {
    let code = code.to_arg();
    let output = ddcutil.run("getvcp", &["--brief", code.as_str()], Some(bus)).await?;
    parse_feature_value(&output.stdout)
}

/// Capabilities and current values of one display.
///
/// Every ddcutil call for the bus is awaited in turn; ddcutil output
/// gets corrupted by concurrent calls on one bus.
pub async fn gather_monitor<R: CommandRunner>(
    ddcutil: &DdcutilWrapper<R>,
    display: DisplayEntry,
) -> Result<Monitor> {
    let bus = display.bus;
    let output = ddcutil
        .run("capabilities", &["--brief"], Some(bus))
        .await
        .inspect_err(|e| warn!(bus, error = %e, "Failed to parse monitor capabilities"))?;
    let capabilities = parse_capabilities(&output.stdout);

    let mut property_values = BTreeMap::new();
    for property in [Property::Brightness, Property::Contrast, Property::PowerMode] {
        let code = FeatureCode::for_property(property);
        let Some(advertised) = capabilities.get(code.code()) else {
            continue;
        };
        let value = feature_value(ddcutil, bus, code).await?;
        let property_value = if property.is_continuous() {
            PropertyValue::Continuous {
                value,
                min_value: 0,
                max_value: 100,
            }
        } else {
            PropertyValue::Enumerated {
                value,
                choices: advertised
                    .iter()
                    .flatten()
                    .map(|choice| i64::from(*choice))
                    .collect(),
            }
        };
        property_values.insert(property, property_value);
    }

    Ok(Monitor {
        name: display.name,
        adapter: AdapterKind::Ddcci,
        id: bus,
        property_values,
        ddcutil_id: Some(display.ddcutil_id),
        vcp_capabilities: Some(capabilities),
    })
}

/// Detect every DDC/CI monitor with its capabilities and current values.
///
/// Monitors are queried concurrently. A monitor whose queries fail is
/// logged and left out of the result.
pub async fn detect_monitors<R: CommandRunner>(
    ddcutil: &DdcutilWrapper<R>,
) -> Result<AdapterMonitors> {
    info!("Detect connected DDC/CI monitors");
    let output = ddcutil.run("detect", &[], None).await?;
    let root = Node::parse_text(&output.stdout)?;
    debug!(entries = root.children().len(), "Parsed detect output");

    let displays = select_displays(&root);
    let results = join_all(
        displays
            .into_iter()
            .map(|display| gather_monitor(ddcutil, display)),
    )
    .await;

    let total = results.len();
    let mut monitors = AdapterMonitors::new();
    for result in results {
        match result {
            Ok(monitor) => {
                monitors.insert(monitor.id, monitor);
            }
            Err(e) => warn!(error = %e, "Failed to retrieve data for one monitor"),
        }
    }
    info!(
        working = monitors.len(),
        malfunctioning = total - monitors.len(),
        "Detected monitor buses"
    );
    Ok(monitors)
}
