// ── Registered entity table ──
//
// Owns every projection entity of one config entry. The scheduler's
// notification fan-out is the only writer; hosts read snapshots or
// subscribe to them through `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{trace, warn};

use mercury_api::{SwitchState, SwitchValue};

use crate::model::{DeviceIdentity, EntityDescriptor, EntityKind};
use crate::projection::{EntityState, ProjectionEntity};
use crate::restore::RestoreStore;
use crate::scheduler::StateObserver;

/// The set of entities registered for one switch.
///
/// Uses `DashMap` for O(1) lookups by unique id and a `watch` channel
/// carrying a rebuilt snapshot after every refresh. Registration order
/// is fixed at construction.
pub struct EntityTable {
    /// Primary storage: entity unique id -> entity.
    by_id: DashMap<String, ProjectionEntity>,

    /// Registration order of unique ids.
    order: Vec<String>,

    /// Version counter, bumped on every refresh.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt after each refresh.
    snapshot: watch::Sender<Arc<Vec<EntityState>>>,
}

impl EntityTable {
    pub fn new(entities: Vec<ProjectionEntity>) -> Self {
        let by_id = DashMap::with_capacity(entities.len());
        let mut order = Vec::with_capacity(entities.len());
        for entity in entities {
            let id = entity.unique_id().to_owned();
            if by_id.contains_key(&id) {
                warn!(unique_id = %id, "duplicate entity id, keeping the first");
                continue;
            }
            order.push(id.clone());
            by_id.insert(id, entity);
        }

        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let table = Self {
            by_id,
            order,
            version,
            snapshot,
        };
        table.rebuild_snapshot();
        table
    }

    /// Construct the entities for `descriptors`.
    ///
    /// With a flat map every entity is projected from it and the restore
    /// store is not consulted. Without one, sensors start from their
    /// persisted values.
    pub fn materialize(
        descriptors: Vec<EntityDescriptor>,
        identity: &DeviceIdentity,
        state: Option<&SwitchState>,
        restore: &dyn RestoreStore,
    ) -> Self {
        let entities = descriptors
            .into_iter()
            .map(|descriptor| ProjectionEntity::new(descriptor, identity, state))
            .collect();
        let table = Self::new(entities);
        if state.is_none() {
            table.restore_from(restore);
        }
        table
    }

    /// Re-project every entity from `state`.
    pub fn refresh_all(&self, state: &SwitchState) {
        for mut entry in self.by_id.iter_mut() {
            entry.value_mut().refresh(Some(state));
        }
        trace!(entities = self.by_id.len(), "entities refreshed");
        self.rebuild_snapshot();
        self.bump_version();
    }

    /// Seed sensors from persisted values.
    fn restore_from(&self, store: &dyn RestoreStore) {
        for mut entry in self.by_id.iter_mut() {
            if entry.kind() == EntityKind::Sensor {
                let last = store.last_value(entry.unique_id());
                entry.value_mut().restore(last);
            }
        }
        self.rebuild_snapshot();
        self.bump_version();
    }

    /// Current sensor values keyed by entity unique id, for persistence.
    pub fn sensor_values(&self) -> Vec<(String, Option<SwitchValue>)> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(|e| e.kind() == EntityKind::Sensor)
            .map(|e| (e.unique_id().to_owned(), e.native_value().cloned()))
            .collect()
    }

    /// Look up an entity by its flat-map key.
    pub fn get_by_key(&self, key: &str) -> Option<EntityState> {
        self.by_id
            .iter()
            .find(|e| e.value().key() == key)
            .map(|e| e.value().snapshot())
    }

    pub fn get(&self, unique_id: &str) -> Option<EntityState> {
        self.by_id.get(unique_id).map(|e| e.snapshot())
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<EntityState>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshots; the receiver is marked changed after every
    /// refresh.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<EntityState>>> {
        self.snapshot.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Rebuild the snapshot from current state, in registration order.
    fn rebuild_snapshot(&self) {
        let snap: Vec<EntityState> = self
            .order
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|e| e.snapshot()))
            .collect();
        self.snapshot.send_replace(Arc::new(snap));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl StateObserver for EntityTable {
    fn state_updated(&self, state: &SwitchState) {
        self.refresh_all(state);
    }
}
