// ── Entity descriptors ──
//
// A descriptor is the static half of an entity: which flat-map key it
// projects, how it is named and presented, and which extractor turns the
// raw value into the displayed one. Descriptors are built once by the
// catalog and never change afterwards.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use mercury_api::SwitchValue;

use crate::coerce::coerce_bool;

/// Which host platform an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BinarySensor,
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    TotalIncreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Connectivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Diagnostic,
}

/// The displayed value of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityValue {
    /// Sensor state; `None` is "unknown".
    Sensor(Option<SwitchValue>),
    /// Binary sensor `is_on`.
    Binary(bool),
}

impl EntityValue {
    pub fn is_on(&self) -> Option<bool> {
        match self {
            Self::Binary(on) => Some(*on),
            Self::Sensor(_) => None,
        }
    }

    pub fn native_value(&self) -> Option<&SwitchValue> {
        match self {
            Self::Sensor(v) => v.as_ref(),
            Self::Binary(_) => None,
        }
    }
}

/// How a raw flat-map value becomes an entity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Extractor {
    /// Raw value shown as-is.
    Identity,
    /// Counters and rates. The raw value is shown as-is; the variant only
    /// tags the entity as numeric.
    Numeric,
    /// Permissive boolean; see [`coerce_bool`].
    Boolean,
}

impl Extractor {
    /// Project a raw value (or its absence) into an entity value.
    ///
    /// An absent key reads as "unknown" for sensors but as `false` for
    /// binary sensors.
    pub fn project(self, raw: Option<&SwitchValue>) -> EntityValue {
        match self {
            Self::Identity | Self::Numeric => EntityValue::Sensor(raw.cloned()),
            Self::Boolean => EntityValue::Binary(raw.is_some_and(coerce_bool)),
        }
    }

    /// Value before the first successful projection.
    pub fn initial(self) -> EntityValue {
        self.project(None)
    }
}

/// Static description of one observable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Flat-map key this entity projects.
    pub key: String,
    /// Name without the device prefix, e.g. `"Port 3 Status"`.
    pub name: String,
    pub kind: EntityKind,
    pub extractor: Extractor,
    pub index: u32,
    pub icon: Option<String>,
    pub unit: Option<String>,
    pub state_class: Option<StateClass>,
    pub device_class: Option<DeviceClass>,
    pub category: Option<EntityCategory>,
}

impl EntityDescriptor {
    /// A text sensor with the identity extractor.
    pub fn sensor(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, EntityKind::Sensor, Extractor::Identity)
    }

    /// A numeric sensor.
    pub fn numeric(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, EntityKind::Sensor, Extractor::Numeric)
    }

    /// A binary sensor with boolean coercion.
    pub fn binary(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(key, name, EntityKind::BinarySensor, Extractor::Boolean)
    }

    fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        kind: EntityKind,
        extractor: Extractor,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            kind,
            extractor,
            index: 0,
            icon: None,
            unit: None,
            state_class: None,
            device_class: None,
            category: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_state_class(mut self, state_class: StateClass) -> Self {
        self.state_class = Some(state_class);
        self
    }

    pub fn with_device_class(mut self, device_class: DeviceClass) -> Self {
        self.device_class = Some(device_class);
        self
    }

    pub fn with_category(mut self, category: EntityCategory) -> Self {
        self.category = Some(category);
        self
    }
}
