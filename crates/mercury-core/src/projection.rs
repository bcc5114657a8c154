// ── Projection entities ──
//
// An entity re-derives its displayed value from one key of the current
// flat map on every poll notification. Refresh is synchronous and
// in-memory; it never fails. Missing keys fall back per extractor.

use serde::Serialize;
use tracing::debug;

use mercury_api::{SwitchState, SwitchValue};

use crate::model::{DeviceIdentity, EntityDescriptor, EntityKind, EntityValue};

/// Runtime entity: a descriptor plus its last materialized value.
#[derive(Debug, Clone)]
pub struct ProjectionEntity {
    descriptor: EntityDescriptor,
    unique_id: String,
    name: String,
    value: EntityValue,
}

impl ProjectionEntity {
    /// Create an entity and project `state` into it immediately.
    pub fn new(
        descriptor: EntityDescriptor,
        identity: &DeviceIdentity,
        state: Option<&SwitchState>,
    ) -> Self {
        let unique_id = identity.entity_unique_id(&descriptor.key, descriptor.index);
        let name = format!("{} {}", identity.display_name, descriptor.name);
        let value = descriptor.extractor.initial();
        let mut entity = Self {
            descriptor,
            unique_id,
            name,
            value,
        };
        entity.refresh(state);
        entity
    }

    /// Re-derive the value from `state`. Without a state nothing changes.
    pub fn refresh(&mut self, state: Option<&SwitchState>) {
        let Some(state) = state else {
            return;
        };

        let raw = state.get(&self.descriptor.key);
        if raw.is_none() {
            debug!(
                key = %self.descriptor.key,
                unique_id = %self.unique_id,
                "key not in switch response"
            );
        }
        self.value = self.descriptor.extractor.project(raw);
    }

    /// Seed a sensor with its last persisted value.
    ///
    /// Binary sensors are not restored; they stay `false` until the
    /// first poll.
    pub fn restore(&mut self, last: Option<SwitchValue>) {
        if self.descriptor.kind == EntityKind::Sensor && last.is_some() {
            self.value = EntityValue::Sensor(last);
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn kind(&self) -> EntityKind {
        self.descriptor.kind
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &EntityValue {
        &self.value
    }

    /// Binary sensor state; `None` for sensors.
    pub fn is_on(&self) -> Option<bool> {
        self.value.is_on()
    }

    /// Sensor state; `None` when unknown or for binary sensors.
    pub fn native_value(&self) -> Option<&SwitchValue> {
        self.value.native_value()
    }

    pub fn snapshot(&self) -> EntityState {
        EntityState {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
            value: self.value.clone(),
        }
    }
}

/// Point-in-time view of an entity, handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub unique_id: String,
    pub name: String,
    pub descriptor: EntityDescriptor,
    pub value: EntityValue,
}
