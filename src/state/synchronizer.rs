use crate::bus::{BusError, EventBus};
use crate::config::BusConfig;
use crate::device::DeviceKind;
use crate::event::PowerUpdateEvent;
use crate::state::metrics::SyncMetrics;
use crate::state::registry::DeviceRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// What `apply` did with an event
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Patch written; `fields` attributes overwritten
    Applied { fields: usize },
    /// No device with this uuid (not loaded yet, or removed)
    TargetNotFound,
    /// Device exists but its type does not accept this patch
    KindMismatch {
        expected: DeviceKind,
        found: String,
    },
}

/// Applies push events to the device registry.
///
/// This is the registry's only writer. Events are applied one at a time in
/// delivery order, so the last patch delivered wins per field.
pub struct EventSynchronizer {
    registry: Arc<DeviceRegistry>,
    metrics: SyncMetrics,
}

impl EventSynchronizer {
    pub fn new(registry: Arc<DeviceRegistry>, metrics: SyncMetrics) -> Self {
        Self { registry, metrics }
    }

    /// Apply one event to its target device.
    ///
    /// A missing target is an expected race with registry population: the
    /// event is dropped without error.
    pub fn apply(&self, event: &PowerUpdateEvent) -> ApplyOutcome {
        let handle = match self.registry.find(&event.uuid) {
            Some(handle) => handle,
            None => {
                debug!(uuid = %event.uuid, "No device for event, discarding");
                self.metrics.record_not_found();
                return ApplyOutcome::TargetNotFound;
            }
        };

        // Whole patch under one write guard: readers never see half of it
        let mut device = handle.write();

        let expected = event.patch.kind();
        if device.kind() != Some(expected) {
            warn!(
                uuid = %event.uuid,
                device_type = %device.device_type,
                patch_type = %expected,
                "Patch does not match device type, discarding"
            );
            self.metrics.record_kind_mismatch();
            return ApplyOutcome::KindMismatch {
                expected,
                found: device.device_type.clone(),
            };
        }

        let fields = device.apply_patch(&event.patch);
        drop(device);

        // Empty patches leave the record as it was
        if fields > 0 {
            self.metrics.record_applied();
        }
        debug!(uuid = %event.uuid, fields = fields, "Device patched");

        ApplyOutcome::Applied { fields }
    }

    /// Subscribe `apply` to both teleinfo channels.
    ///
    /// Called once at startup; there is no unsubscribe.
    pub fn attach(self: &Arc<Self>, bus: &EventBus, config: &BusConfig) -> Result<(), BusError> {
        for channel in [&config.power_channel, &config.consumption_channel] {
            let sync = Arc::clone(self);
            bus.subscribe(channel, move |event: &PowerUpdateEvent| {
                sync.apply(event);
            })?;
        }
        Ok(())
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }
}
