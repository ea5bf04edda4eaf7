//! Monitor identity from EDID serial numbers.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::tree::Node;

/// `<value> (0x<hex>)` as printed by ddcutil for binary serial numbers.
static BINARY_SERIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Za-z]+) \(0x[0-9A-Za-z]+\)\s*$").expect("valid binary serial regex")
});

/// Serial numbers read from a monitor's EDID synopsis.
///
/// Two identities are equal only when at least one field is known and
/// every field matches. Two identities without any known field never
/// compare equal, so monitors with broken EDIDs are not merged. This makes
/// the relation non-reflexive, which is why `Eq` is not implemented.
#[derive(Debug, Clone, Default)]
pub struct SerialIdentity {
    pub serial_number: Option<String>,
    pub binary_serial_number: Option<String>,
}

impl SerialIdentity {
    /// Build an identity, normalising the binary serial number.
    pub fn new(serial_number: Option<&str>, binary_serial_number: Option<&str>) -> Self {
        Self {
            serial_number: serial_number.map(str::to_string),
            binary_serial_number: binary_serial_number.map(normalize_binary_serial),
        }
    }

    /// Read the identity of one `Display N` node of `ddcutil detect` output.
    pub fn from_node(display: &Node) -> Self {
        Self::new(
            edid_field(display, "Serial number"),
            edid_field(display, "Binary serial number"),
        )
    }

    fn has_any(&self) -> bool {
        [&self.serial_number, &self.binary_serial_number]
            .iter()
            .any(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }

    /// Whether this identity equals any identity in `seen`.
    pub fn is_duplicate(&self, seen: &[Self]) -> bool {
        seen.iter().any(|other| self == other)
    }
}

impl PartialEq for SerialIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.has_any()
            && other.has_any()
            && self.serial_number == other.serial_number
            && self.binary_serial_number == other.binary_serial_number
    }
}

fn edid_field<'a>(node: &'a Node, key: &str) -> Option<&'a str> {
    match node.walk(&["EDID synopsis", key]) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(entry = node.key(), error = %e, "Monitor has no {key}");
            None
        }
    }
}

/// `"00123 (0x0000007b)"` becomes `"123"`; anything else is kept as is.
fn normalize_binary_serial(raw: &str) -> String {
    let Some(captures) = BINARY_SERIAL.captures(raw) else {
        return raw.to_string();
    };
    let digits = &captures[1];
    match digits.parse::<u64>() {
        Ok(number) => number.to_string(),
        Err(e) => {
            warn!(raw, error = %e, "Binary serial number is not an integer");
            raw.to_string()
        }
    }
}
