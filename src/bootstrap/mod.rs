// Initial registry population from the session device fetch

use crate::device::{Device, DeviceKind};
use crate::state::DeviceRegistry;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Source of the full device list fetched at session start
pub trait DeviceSource {
    fn fetch_devices(&self) -> Result<Vec<Device>>;
}

/// Devices held in memory
pub struct StaticSource(pub Vec<Device>);

impl DeviceSource for StaticSource {
    fn fetch_devices(&self) -> Result<Vec<Device>> {
        Ok(self.0.clone())
    }
}

/// `get_devices` response saved as JSON.
///
/// Accepts either an array of device records or an object keyed by uuid
/// (records may then omit their own `uuid`).
pub struct JsonFileSource {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeviceDump {
    List(Vec<Device>),
    ByUuid(BTreeMap<String, Value>),
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DeviceSource for JsonFileSource {
    fn fetch_devices(&self) -> Result<Vec<Device>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read devices file {}", self.path.display()))?;
        let dump: DeviceDump = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse devices file {}", self.path.display()))?;

        match dump {
            DeviceDump::List(devices) => Ok(devices),
            DeviceDump::ByUuid(map) => map
                .into_iter()
                .map(|(uuid, mut record)| {
                    if let Value::Object(fields) = &mut record {
                        let stated = fields
                            .entry("uuid")
                            .or_insert_with(|| Value::String(uuid.clone()));
                        if stated.as_str() != Some(uuid.as_str()) {
                            bail!("Device keyed '{}' declares uuid {}", uuid, stated);
                        }
                    }
                    serde_json::from_value(record)
                        .with_context(|| format!("Invalid device record '{}'", uuid))
                })
                .collect(),
        }
    }
}

/// Fetch every device from `source` and load it into the registry.
///
/// Returns the number of devices added.
pub fn bootstrap(registry: &DeviceRegistry, source: &dyn DeviceSource) -> Result<usize> {
    let devices = source.fetch_devices().context("Device fetch failed")?;

    let power = devices
        .iter()
        .filter(|d| d.kind() == Some(DeviceKind::InstantPower))
        .count();
    let consumption = devices
        .iter()
        .filter(|d| d.kind() == Some(DeviceKind::PowerConsumption))
        .count();

    let added = registry
        .populate(devices)
        .context("Failed to populate device registry")?;

    info!(
        devices = added,
        instant_power = power,
        power_consumption = consumption,
        "Bootstrap complete"
    );
    Ok(added)
}
