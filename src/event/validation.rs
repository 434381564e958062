use super::{BusMessage, PowerUpdateEvent};
use crate::device::{DeviceKind, DevicePatch};
use serde_json::{Map, Value};
use std::fmt;

/// Errors raised while typing a raw bus message
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    MissingDeviceId,
    ParamsNotObject,
    InvalidPatch { kind: DeviceKind, reason: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingDeviceId => write!(f, "device_id is required"),
            DecodeError::ParamsNotObject => write!(f, "params must be a JSON object"),
            DecodeError::InvalidPatch { kind, reason } => {
                write!(f, "invalid {} patch: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes a raw message into a typed event for devices of `kind`.
///
/// Rules:
/// - device_id: required, non-empty
/// - params: must be a JSON object (a missing params is an empty patch)
/// - params keys: must belong to the patch of `kind`, with matching value types
pub fn decode(message: &BusMessage, kind: DeviceKind) -> Result<PowerUpdateEvent, DecodeError> {
    let uuid = match message.device_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(DecodeError::MissingDeviceId),
    };

    let empty = Value::Object(Map::new());
    let params = match &message.params {
        Value::Null => &empty,
        params @ Value::Object(_) => params,
        _ => return Err(DecodeError::ParamsNotObject),
    };

    let patch = DevicePatch::decode(kind, params).map_err(|e| DecodeError::InvalidPatch {
        kind,
        reason: e.to_string(),
    })?;

    Ok(PowerUpdateEvent { uuid, patch })
}
