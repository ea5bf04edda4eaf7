//! Monitor model shared by adapters, validation and the detect cache.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Identifier of a monitor adapter implementation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Monitors reachable over DDC/CI through `ddcutil`
    Ddcci,
}

impl AdapterKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ddcci => "ddcci",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitor properties exposed on the command line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Property {
    Brightness,
    Contrast,
    PowerMode,
}

impl Property {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::PowerMode => "power_mode",
        }
    }

    /// Continuous properties accept any integer in a range.
    pub const fn is_continuous(self) -> bool {
        matches!(self, Self::Brightness | Self::Contrast)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of a property together with the values it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Any integer in `[min_value, max_value]`; writes outside are clamped.
    Continuous {
        value: i64,
        min_value: i64,
        max_value: i64,
    },
    /// One of a fixed set of choices; other writes are rejected.
    Enumerated { value: i64, choices: Vec<i64> },
}

impl PropertyValue {
    pub const fn value(&self) -> i64 {
        match self {
            Self::Continuous { value, .. } | Self::Enumerated { value, .. } => *value,
        }
    }

    pub fn set_value(&mut self, new_value: i64) {
        match self {
            Self::Continuous { value, .. } | Self::Enumerated { value, .. } => *value = new_value,
        }
    }

    pub const fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous { .. })
    }
}

/// VCP feature codes a monitor advertises.
///
/// `None` marks a continuous feature, `Some(values)` an enumerated feature
/// with its accepted values in the order the monitor reported them.
/// Serialized with upper-case hex string keys (`"10"`, `"D6"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityMap(BTreeMap<u8, Option<Vec<u8>>>);

impl CapabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: u8, values: Option<Vec<u8>>) {
        self.0.insert(code, values);
    }

    pub fn contains(&self, code: u8) -> bool {
        self.0.contains_key(&code)
    }

    /// Accepted values of an enumerated feature.
    pub fn values(&self, code: u8) -> Option<&[u8]> {
        self.0.get(&code).and_then(|values| values.as_deref())
    }

    pub fn get(&self, code: u8) -> Option<&Option<Vec<u8>>> {
        self.0.get(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(u8, Option<Vec<u8>>)> for CapabilityMap {
    fn from_iter<T: IntoIterator<Item = (u8, Option<Vec<u8>>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for CapabilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (code, values) in &self.0 {
            map.serialize_entry(&format!("{code:X}"), values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CapabilityMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexKeyVisitor;

        impl<'de> Visitor<'de> for HexKeyVisitor {
            type Value = CapabilityMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by hexadecimal VCP feature codes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = CapabilityMap::new();
                while let Some((key, values)) = access.next_entry::<String, Option<Vec<u8>>>()? {
                    let code = u8::from_str_radix(&key, 16).map_err(|_| {
                        de::Error::custom(format!("invalid VCP feature code `{key}`"))
                    })?;
                    map.insert(code, values);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(HexKeyVisitor)
    }
}

/// One detected display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub name: String,
    pub adapter: AdapterKind,
    /// Adapter specific identifier; the i2c bus number for DDC/CI.
    pub id: u32,
    pub property_values: BTreeMap<Property, PropertyValue>,
    /// Display number assigned by `ddcutil detect`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddcutil_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcp_capabilities: Option<CapabilityMap>,
}

impl Monitor {
    pub fn property(&self, property: Property) -> Option<&PropertyValue> {
        self.property_values.get(&property)
    }
}

/// Monitors of one adapter keyed by monitor id.
pub type AdapterMonitors = BTreeMap<u32, Monitor>;

/// Result of a detection pass: adapter, then monitor id.
pub type DetectionSummary = BTreeMap<AdapterKind, AdapterMonitors>;
