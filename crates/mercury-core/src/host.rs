// ── Host platform seam ──
//
// The home-automation runtime owns the device registry and the entity
// registry. The integration only announces what it has.

use std::sync::Mutex;

use indexmap::IndexMap;

use crate::model::DeviceRecord;
use crate::projection::EntityState;

/// Registries provided by the host application.
pub trait Host: Send + Sync {
    /// Create or update the device registry record of a switch.
    fn register_device(&self, device: &DeviceRecord);

    /// Announce the entities of a config entry, in registration order.
    fn register_entities(&self, entry_id: &str, entities: &[EntityState]);

    /// Forget every entity of a config entry.
    fn remove_entities(&self, entry_id: &str);
}

/// Registry kept in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryHost {
    inner: Mutex<Registries>,
}

#[derive(Debug, Default)]
struct Registries {
    devices: IndexMap<String, DeviceRecord>,
    entities: IndexMap<String, Vec<EntityState>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Registries) -> T) -> T {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn devices(&self) -> Vec<DeviceRecord> {
        self.with(|r| r.devices.values().cloned().collect())
    }

    /// Entities of one entry as they were at registration.
    pub fn entities(&self, entry_id: &str) -> Vec<EntityState> {
        self.with(|r| r.entities.get(entry_id).cloned().unwrap_or_default())
    }

    pub fn entity_ids(&self, entry_id: &str) -> Vec<String> {
        self.entities(entry_id)
            .into_iter()
            .map(|e| e.unique_id)
            .collect()
    }
}

impl Host for MemoryHost {
    fn register_device(&self, device: &DeviceRecord) {
        self.with(|r| {
            r.devices.insert(device.unique_id.clone(), device.clone());
        });
    }

    fn register_entities(&self, entry_id: &str, entities: &[EntityState]) {
        self.with(|r| {
            r.entities.insert(entry_id.to_owned(), entities.to_vec());
        });
    }

    fn remove_entities(&self, entry_id: &str) {
        self.with(|r| {
            r.entities.shift_remove(entry_id);
        });
    }
}
