// ── Domain model ──
//
// Device identity and entity descriptors shared across the crate.

pub mod device;
pub mod entity;

pub use device::{DeviceIdentity, DeviceRecord};
pub use entity::{
    DeviceClass, EntityCategory, EntityDescriptor, EntityKind, EntityValue, Extractor, StateClass,
};
