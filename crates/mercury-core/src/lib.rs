// mercury-core: Polling, entity projection and lifecycle between mercury-api and the host.

pub mod catalog;
pub mod coerce;
pub mod config;
pub mod error;
pub mod flow;
pub mod host;
pub mod integration;
pub mod model;
pub mod projection;
pub mod restore;
pub mod scheduler;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::{build_catalog, discover_vlan_ids};
pub use coerce::coerce_bool;
pub use config::{ConfigEntry, EntryData, EntryOptions, PollConfig};
pub use error::{CoreError, SetupError};
pub use flow::{
    ConfigFlow, ConfigFlowResult, ConfiguredEntries, FlowForm, FormField, OptionsFlow,
    OptionsFlowResult, OptionsInput, UserInput,
};
pub use host::{Host, MemoryHost};
pub use integration::SwitchIntegration;
pub use projection::{EntityState, ProjectionEntity};
pub use restore::{JsonRestoreStore, MemoryRestoreStore, RestoreStore};
pub use scheduler::{PollPhase, PollScheduler, PollStatus, StateObserver};
pub use session::{DeviceSession, SessionInfo};
pub use store::EntityTable;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DeviceClass, DeviceIdentity, DeviceRecord, EntityCategory, EntityDescriptor, EntityKind,
    EntityValue, Extractor, StateClass,
};
