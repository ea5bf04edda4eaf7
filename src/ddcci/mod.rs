//! DDC/CI monitor adapter built on `ddcutil`.

pub mod ddcutil;
pub mod detect;
pub mod serial;

pub use ddcutil::DdcutilWrapper;
pub use serial::SerialIdentity;

use tracing::{info, warn};

use crate::config::DdcciSection;
use crate::error::Result;
use crate::monitor::{AdapterMonitors, Property};
use crate::process::CommandRunner;

/// MCCS VCP feature codes of the supported properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FeatureCode {
    Brightness = 0x10,
    Contrast = 0x12,
    PowerMode = 0xD6,
}

impl FeatureCode {
    pub const fn for_property(property: Property) -> Self {
        match property {
            Property::Brightness => Self::Brightness,
            Property::Contrast => Self::Contrast,
            Property::PowerMode => Self::PowerMode,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Argument form accepted by `getvcp` and `setvcp`, e.g. `0xd6`.
    pub fn to_arg(self) -> String {
        format!("{:#x}", self.code())
    }
}

/// Values of VCP feature 0xD6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerMode {
    On = 0x01,
    Standby = 0x02,
    Suspend = 0x03,
    OffSoft = 0x04,
    OffHard = 0x05,
}

impl PowerMode {
    pub const fn from_value(value: i64) -> Option<Self> {
        match value {
            0x01 => Some(Self::On),
            0x02 => Some(Self::Standby),
            0x03 => Some(Self::Suspend),
            0x04 => Some(Self::OffSoft),
            0x05 => Some(Self::OffHard),
            _ => None,
        }
    }
}

/// Detects and controls monitors through ddcutil.
#[derive(Debug, Clone)]
pub struct DdcciAdapter<R> {
    ddcutil: DdcutilWrapper<R>,
}

impl<R: CommandRunner> DdcciAdapter<R> {
    /// Create the adapter and log the installed ddcutil version.
    pub fn new(config: &DdcciSection, runner: R) -> Self {
        let ddcutil = DdcutilWrapper::new(config, runner);
        match ddcutil.version() {
            Ok(version) => info!(%version, "Using ddcutil"),
            Err(e) => warn!(error = %e, "Could not determine the ddcutil version"),
        }
        Self { ddcutil }
    }

    pub const fn ddcutil(&self) -> &DdcutilWrapper<R> {
        &self.ddcutil
    }

    /// Detected monitors keyed by i2c bus.
    pub async fn detect(&self) -> Result<AdapterMonitors> {
        detect::detect_monitors(&self.ddcutil).await
    }

    /// Write `value` to `property` of the monitor on `bus`.
    pub async fn set_property(&self, bus: u32, property: Property, value: i64) -> Result<()> {
        let code = FeatureCode::for_property(property);
        if code == FeatureCode::PowerMode && PowerMode::from_value(value).is_none() {
            warn!(bus, value, "Writing a power mode outside the MCCS range");
        }
        let value = value.to_string();
        self.ddcutil
            .run("setvcp", &[code.to_arg().as_str(), value.as_str()], Some(bus))
            .await?;
        info!(bus, %property, %value, "Property set");
        Ok(())
    }
}
