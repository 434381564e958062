use crate::device::DevicePatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod validation;
#[cfg(test)]
mod tests;

pub use validation::{decode, DecodeError};

/// BusMessage is the raw push event as delivered by the backend.
///
/// The envelope is domain-agnostic: `params` stays untyped until the
/// channel tells us which device patch it carries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BusMessage {
    /// Channel name (e.g., "teleinfo.power.update")
    pub event: String,

    /// Target device uuid
    #[serde(default, alias = "uuid", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Field updates for the target device
    #[serde(default)]
    pub params: Value,
}

impl BusMessage {
    pub fn new(event: impl Into<String>, device_id: impl Into<String>, params: Value) -> Self {
        Self {
            event: event.into(),
            device_id: Some(device_id.into()),
            params,
        }
    }
}

/// Typed partial-state update for one device
#[derive(Clone, Debug, PartialEq)]
pub struct PowerUpdateEvent {
    pub uuid: String,
    pub patch: DevicePatch,
}
