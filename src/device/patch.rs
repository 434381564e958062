use super::DeviceKind;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Fields carried by a `teleinfo.power.update` event.
///
/// Every field is optional: an absent field is left untouched on the device.
/// Fields use a double `Option` so that an explicit `null` ("not read yet",
/// "mode unknown") is written, while an absent key is not.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstantPowerPatch {
    /// Unix epoch seconds of the meter reading
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub lastupdate: Option<Option<i64>>,

    /// Instant power in VA
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub power: Option<Option<i64>>,

    /// Current tariff period (PTEC), e.g. "HC.."
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub currentmode: Option<Option<String>>,

    /// Next tariff color or EJP notice
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub nextmode: Option<Option<String>>,

    /// Off-peak (or BASE) index in Wh
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub heurescreuses: Option<Option<i64>>,

    /// Peak index in Wh
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub heurespleines: Option<Option<i64>>,

    /// Subscribed intensity (ISOUSC)
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Option<String>>,
}

/// Fields carried by a `teleinfo.consumption.update` event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowerConsumptionPatch {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub lastupdate: Option<Option<i64>>,

    /// Off-peak consumption over the previous day in Wh
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub heurescreuses: Option<Option<i64>>,

    /// Peak consumption over the previous day in Wh
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub heurespleines: Option<Option<i64>>,
}

/// Partial update for one device, tagged by the device type it targets.
#[derive(Clone, Debug, PartialEq)]
pub enum DevicePatch {
    InstantPower(InstantPowerPatch),
    PowerConsumption(PowerConsumptionPatch),
}

impl DevicePatch {
    /// Decode untyped event params into the patch for `kind`.
    ///
    /// Unknown keys and mistyped values are rejected.
    pub fn decode(kind: DeviceKind, params: &Value) -> Result<Self, serde_json::Error> {
        match kind {
            DeviceKind::InstantPower => {
                InstantPowerPatch::deserialize(params).map(DevicePatch::InstantPower)
            }
            DeviceKind::PowerConsumption => {
                PowerConsumptionPatch::deserialize(params).map(DevicePatch::PowerConsumption)
            }
        }
    }

    /// Device type this patch may be applied to
    pub fn kind(&self) -> DeviceKind {
        match self {
            DevicePatch::InstantPower(_) => DeviceKind::InstantPower,
            DevicePatch::PowerConsumption(_) => DeviceKind::PowerConsumption,
        }
    }

    /// Present fields as attribute name/value pairs, in declaration order
    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        match self {
            DevicePatch::InstantPower(p) => {
                put(&mut out, "lastupdate", &p.lastupdate);
                put(&mut out, "power", &p.power);
                put(&mut out, "currentmode", &p.currentmode);
                put(&mut out, "nextmode", &p.nextmode);
                put(&mut out, "heurescreuses", &p.heurescreuses);
                put(&mut out, "heurespleines", &p.heurespleines);
                put(&mut out, "subscription", &p.subscription);
            }
            DevicePatch::PowerConsumption(p) => {
                put(&mut out, "lastupdate", &p.lastupdate);
                put(&mut out, "heurescreuses", &p.heurescreuses);
                put(&mut out, "heurespleines", &p.heurespleines);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

fn put<T>(out: &mut Vec<(&'static str, Value)>, name: &'static str, field: &Option<T>)
where
    T: Clone + Into<Value>,
{
    if let Some(value) = field {
        out.push((name, value.clone().into()));
    }
}

/// Maps a present key to `Some`, so `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
