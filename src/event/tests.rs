use super::*;
use crate::device::DeviceKind;
use serde_json::json;

#[test]
fn test_valid_power_message_decodes() {
    let message = BusMessage::new(
        "teleinfo.power.update",
        "dev-1",
        json!({"power": 150, "lastupdate": 2000}),
    );

    let event = decode(&message, DeviceKind::InstantPower).unwrap();
    assert_eq!(event.uuid, "dev-1");
    assert_eq!(event.patch.kind(), DeviceKind::InstantPower);
    assert_eq!(event.patch.fields().len(), 2);
}

#[test]
fn test_uuid_alias_accepted() {
    let message: BusMessage = serde_json::from_value(json!({
        "event": "teleinfo.consumption.update",
        "uuid": "dev-2",
        "params": {"heurescreuses": 12}
    }))
    .unwrap();

    assert_eq!(message.device_id.as_deref(), Some("dev-2"));
    let event = decode(&message, DeviceKind::PowerConsumption).unwrap();
    assert_eq!(event.uuid, "dev-2");
}

#[test]
fn test_missing_device_id_fails() {
    let message: BusMessage = serde_json::from_value(json!({
        "event": "teleinfo.power.update",
        "params": {"power": 5}
    }))
    .unwrap();

    assert_eq!(
        decode(&message, DeviceKind::InstantPower),
        Err(DecodeError::MissingDeviceId)
    );
}

#[test]
fn test_empty_device_id_fails() {
    let message = BusMessage::new("teleinfo.power.update", "", json!({"power": 5}));
    assert_eq!(
        decode(&message, DeviceKind::InstantPower),
        Err(DecodeError::MissingDeviceId)
    );
}

#[test]
fn test_unknown_param_fails() {
    let message = BusMessage::new("teleinfo.power.update", "dev-1", json!({"watts": 5}));
    match decode(&message, DeviceKind::InstantPower).unwrap_err() {
        DecodeError::InvalidPatch { kind, reason } => {
            assert_eq!(kind, DeviceKind::InstantPower);
            assert!(reason.contains("watts"));
        }
        other => panic!("Expected InvalidPatch error, got {:?}", other),
    }
}

#[test]
fn test_mistyped_param_fails() {
    let message = BusMessage::new(
        "teleinfo.consumption.update",
        "dev-2",
        json!({"heurespleines": "lots"}),
    );
    assert!(matches!(
        decode(&message, DeviceKind::PowerConsumption),
        Err(DecodeError::InvalidPatch { .. })
    ));
}

#[test]
fn test_decode_error_display() {
    assert_eq!(DecodeError::MissingDeviceId.to_string(), "device_id is required");
    assert_eq!(
        DecodeError::ParamsNotObject.to_string(),
        "params must be a JSON object"
    );
}
