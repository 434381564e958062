use crate::device::DeviceKind;
use crate::state::{DeviceHandle, DeviceRegistry};
use serde_json::Value;

/// Read-only view of the teleinfo devices for the dashboard widget.
///
/// Holds shared handles resolved once at bind time; every accessor reads
/// the live record, so patches applied later are visible without rebinding.
#[derive(Clone, Debug, Default)]
pub struct TeleinfoBinding {
    instant_power: Option<DeviceHandle>,
    power_consumption: Option<DeviceHandle>,
}

/// Previous day consumption as shown on the widget
#[derive(Clone, Debug, PartialEq)]
pub struct Consumption {
    pub heures_creuses: Option<i64>,
    pub heures_pleines: Option<i64>,
    pub last_update: Option<i64>,
}

impl TeleinfoBinding {
    /// Resolve the first device of each teleinfo type; either may be missing.
    pub fn bind(registry: &DeviceRegistry) -> Self {
        Self {
            instant_power: registry.first_of_type(DeviceKind::InstantPower),
            power_consumption: registry.first_of_type(DeviceKind::PowerConsumption),
        }
    }

    pub fn instant_power_device(&self) -> Option<&DeviceHandle> {
        self.instant_power.as_ref()
    }

    pub fn power_consumption_device(&self) -> Option<&DeviceHandle> {
        self.power_consumption.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.instant_power.is_some()
    }

    /// Instant power in VA
    pub fn power(&self) -> Option<i64> {
        read_int(self.instant_power.as_ref(), "power")
    }

    pub fn current_mode(&self) -> Option<String> {
        read_text(self.instant_power.as_ref(), "currentmode")
    }

    pub fn next_mode(&self) -> Option<String> {
        read_text(self.instant_power.as_ref(), "nextmode")
    }

    /// Off-peak index
    pub fn heures_creuses(&self) -> Option<i64> {
        read_int(self.instant_power.as_ref(), "heurescreuses")
    }

    /// Peak index
    pub fn heures_pleines(&self) -> Option<i64> {
        read_int(self.instant_power.as_ref(), "heurespleines")
    }

    pub fn subscription(&self) -> Option<String> {
        read_text(self.instant_power.as_ref(), "subscription")
    }

    pub fn last_update(&self) -> Option<i64> {
        read_int(self.instant_power.as_ref(), "lastupdate")
    }

    pub fn consumption(&self) -> Option<Consumption> {
        let device = self.power_consumption.as_ref()?;
        let device = device.read();
        Some(Consumption {
            heures_creuses: device.attribute("heurescreuses").and_then(Value::as_i64),
            heures_pleines: device.attribute("heurespleines").and_then(Value::as_i64),
            last_update: device.attribute("lastupdate").and_then(Value::as_i64),
        })
    }
}

fn read_int(handle: Option<&DeviceHandle>, field: &str) -> Option<i64> {
    handle?.read().attribute(field).and_then(Value::as_i64)
}

fn read_text(handle: Option<&DeviceHandle>, field: &str) -> Option<String> {
    handle?
        .read()
        .attribute(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}
