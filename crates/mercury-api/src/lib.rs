//! Vendor client seam for Mercury managed switches.
//!
//! The switch itself is driven by an external, blocking vendor client.
//! This crate pins down the contract that client has to satisfy and the
//! data it hands back:
//!
//! - **[`ConnectorFactory`]** / **[`SwitchConnector`]**: open a session,
//!   autodetect the model, log in, read the stable unique id, and fetch
//!   the full switch state in one call.
//! - **[`SwitchState`]**: the flat, string-keyed map produced by one
//!   fetch (`port_{n}_status`, `vlan_{id}_name`, `switch_mac`, ...).
//! - **[`SwitchValue`]**: the loosely typed value stored under each key.
//! - **[`Error`]**: every failure mode a connector may report.

pub mod connector;
pub mod error;
pub mod state;
pub mod value;

pub use connector::{ConnectorFactory, Credentials, SwitchConnector, SwitchModel};
pub use error::Error;
pub use state::SwitchState;
pub use value::SwitchValue;
