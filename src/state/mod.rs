// Device registry and event synchronization

mod metrics;
mod registry;
mod synchronizer;

pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use registry::{DeviceHandle, DeviceRegistry, RegistryError};
pub use synchronizer::{ApplyOutcome, EventSynchronizer};
