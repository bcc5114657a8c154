// ── Vendor connector contract ──
//
// The vendor client is synchronous and stateful: it keeps a login cookie
// and model-specific parsing tables on the handle. Callers must never
// share a handle across threads without serializing access, and should
// run every call on a blocking executor.

use std::fmt;

use secrecy::SecretString;

use crate::error::Error;
use crate::state::SwitchState;

/// Everything needed to open a session with a switch.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Hostname or IP address of the switch's management interface.
    pub host: String,
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// The switch model as reported by autodetection.
///
/// Autodetection is best-effort; an undetected model has an empty name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SwitchModel {
    name: String,
}

impl SwitchModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// A model that autodetection could not identify.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_known(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SwitchModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            f.write_str(&self.name)
        } else {
            f.write_str("Unknown")
        }
    }
}

/// An open, non-reentrant session with one switch.
///
/// All methods perform blocking network I/O.
pub trait SwitchConnector: Send {
    /// Probe the switch to identify its model. Failure leaves the model unknown.
    fn autodetect_model(&mut self) -> Result<(), Error>;

    /// The currently detected model.
    fn model(&self) -> SwitchModel;

    /// Log in with the session's credentials. `Ok(false)` means the
    /// switch answered but rejected the credentials.
    fn login(&mut self) -> Result<bool, Error>;

    /// Stable identifier for this physical switch.
    fn unique_id(&mut self) -> Result<String, Error>;

    /// Number of physical ports on the detected model.
    fn port_count(&self) -> u16;

    /// Fetch the complete flat switch state.
    fn fetch_state(&mut self) -> Result<SwitchState, Error>;
}

/// Opens [`SwitchConnector`] sessions.
pub trait ConnectorFactory: Send + Sync {
    /// Open a session. Transport failures surface as
    /// [`Error::Connection`] or [`Error::Timeout`].
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn SwitchConnector>, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_displays_placeholder() {
        let model = SwitchModel::unknown();
        assert!(!model.is_known());
        assert_eq!(model.to_string(), "Unknown");
    }

    #[test]
    fn known_model_displays_name() {
        let model = SwitchModel::new("SG108Pro");
        assert!(model.is_known());
        assert_eq!(model.to_string(), "SG108Pro");
    }
}
