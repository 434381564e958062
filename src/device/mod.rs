use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

mod patch;

pub use patch::{DevicePatch, InstantPowerPatch, PowerConsumptionPatch};

/// Device type handled by the teleinfo dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Live meter reading (power, tariff mode, indexes)
    InstantPower,
    /// Daily consumption split between off-peak and peak hours
    PowerConsumption,
}

impl DeviceKind {
    /// Canonical `type` string as returned by the device fetch
    pub const fn as_str(self) -> &'static str {
        match self {
            DeviceKind::InstantPower => "teleinfoinstantpower",
            DeviceKind::PowerConsumption => "teleinfopowerconsumption",
        }
    }

    /// Parse a `type` discriminator, accepting the short aliases.
    ///
    /// Returns `None` for device types owned by other modules.
    pub fn parse(device_type: &str) -> Option<Self> {
        match device_type {
            "teleinfoinstantpower" | "instant-power" => Some(DeviceKind::InstantPower),
            "teleinfopowerconsumption" | "power-consumption" => Some(DeviceKind::PowerConsumption),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached representation of one device, as fetched at session start.
///
/// Serialized flat, the way the device fetch returns it:
/// `{"uuid": "...", "type": "...", "name": "...", "power": 0, ...}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device identifier, sole join key with events
    pub uuid: String,

    /// Type discriminator selecting the dashboard widget
    #[serde(rename = "type")]
    pub device_type: String,

    /// Domain fields (vary by device type)
    #[serde(flatten)]
    pub attributes: HashMap<String, Value>,
}

impl Device {
    pub fn new(uuid: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            device_type: device_type.into(),
            attributes: HashMap::new(),
        }
    }

    /// Instant power device with the default attribute set
    pub fn instant_power(uuid: impl Into<String>) -> Self {
        Self::new(uuid, DeviceKind::InstantPower.as_str())
            .with_attribute("name", "Instant power")
            .with_attribute("lastupdate", Value::Null)
            .with_attribute("power", 0)
            .with_attribute("currentmode", Value::Null)
            .with_attribute("nextmode", Value::Null)
    }

    /// Power consumption device with the default attribute set
    pub fn power_consumption(uuid: impl Into<String>) -> Self {
        Self::new(uuid, DeviceKind::PowerConsumption.as_str())
            .with_attribute("name", "Power consumption")
            .with_attribute("lastupdate", Value::Null)
            .with_attribute("heurescreuses", 0)
            .with_attribute("heurespleines", 0)
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Teleinfo kind of this device, if it is one
    pub fn kind(&self) -> Option<DeviceKind> {
        DeviceKind::parse(&self.device_type)
    }

    /// Overwrite every field present in the patch, leaving the others untouched.
    ///
    /// Returns the number of attributes written.
    pub(crate) fn apply_patch(&mut self, patch: &DevicePatch) -> usize {
        let fields = patch.fields();
        let written = fields.len();
        for (name, value) in fields {
            self.attributes.insert(name.to_string(), value);
        }
        written
    }
}
