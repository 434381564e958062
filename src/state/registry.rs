use crate::device::{Device, DeviceKind};
use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Shared handle on one cached device.
///
/// Every holder sees the same record: a patch applied by the synchronizer is
/// visible through all clones without re-fetching. Only the crate can take
/// the write lock, which keeps the synchronizer the single writer.
#[derive(Clone, Debug)]
pub struct DeviceHandle(Arc<RwLock<Device>>);

impl DeviceHandle {
    fn new(device: Device) -> Self {
        Self(Arc::new(RwLock::new(device)))
    }

    /// Read the current record
    pub fn read(&self) -> RwLockReadGuard<'_, Device> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Device> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owned copy of the current record
    pub fn snapshot(&self) -> Device {
        self.read().clone()
    }

    /// True if both handles point at the same cached record
    pub fn same_device(&self, other: &DeviceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Registry population errors
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Device has a blank uuid
    EmptyUuid,
    /// Uuid repeated in the batch or already cached
    DuplicateUuid(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyUuid => write!(f, "device uuid cannot be empty"),
            RegistryError::DuplicateUuid(uuid) => write!(f, "duplicate device uuid '{}'", uuid),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Device registry holds the session's in-memory device snapshot
pub struct DeviceRegistry {
    /// Records in population order
    devices: RwLock<Vec<DeviceHandle>>,

    /// Lock-free uuid index for event lookups
    index: DashMap<String, DeviceHandle>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            index: DashMap::new(),
        }
    }

    /// Add the devices returned by the session fetch.
    ///
    /// The batch is checked as a whole: on error nothing is inserted.
    pub fn populate(&self, devices: Vec<Device>) -> Result<usize, RegistryError> {
        let mut ordered = self.devices.write().unwrap_or_else(PoisonError::into_inner);

        let mut seen = HashSet::with_capacity(devices.len());
        for device in &devices {
            if device.uuid.trim().is_empty() {
                return Err(RegistryError::EmptyUuid);
            }
            if self.index.contains_key(&device.uuid) || !seen.insert(device.uuid.as_str()) {
                return Err(RegistryError::DuplicateUuid(device.uuid.clone()));
            }
        }

        let count = devices.len();
        for device in devices {
            let uuid = device.uuid.clone();
            let handle = DeviceHandle::new(device);
            ordered.push(handle.clone());
            self.index.insert(uuid, handle);
        }

        info!(added = count, total = ordered.len(), "Device registry populated");
        Ok(count)
    }

    /// Look up a device by uuid
    pub fn find(&self, uuid: &str) -> Option<DeviceHandle> {
        self.index.get(uuid).map(|h| h.value().clone())
    }

    /// All devices, in population order
    pub fn all(&self) -> Vec<DeviceHandle> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Devices with the given `type` discriminator (aliases included)
    pub fn of_type(&self, kind: DeviceKind) -> Vec<DeviceHandle> {
        self.all()
            .into_iter()
            .filter(|h| h.read().kind() == Some(kind))
            .collect()
    }

    /// First device of the given type, in population order
    pub fn first_of_type(&self, kind: DeviceKind) -> Option<DeviceHandle> {
        self.all().into_iter().find(|h| h.read().kind() == Some(kind))
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.index.contains_key(uuid)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Owned copies of every record, in population order
    pub fn snapshot(&self) -> Vec<Device> {
        self.all().iter().map(DeviceHandle::snapshot).collect()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
