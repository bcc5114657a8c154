// ── Config and options flows ──
//
// Host-driven forms for adding a switch and tuning it afterwards. A
// step without input shows its form; a step with input validates it and
// either re-shows the form with error codes or finishes the flow.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, error};

use mercury_api::{ConnectorFactory, Credentials};

use crate::config::{
    ConfigEntry, EntryData, EntryOptions, DEFAULT_FETCH_TIMEOUT, DEFAULT_SCAN_INTERVAL,
    DEFAULT_USERNAME, MIN_SCAN_INTERVAL_SECS,
};
use crate::error::CoreError;
use crate::session::DeviceSession;

pub const STEP_USER: &str = "user";
pub const STEP_INIT: &str = "init";
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// Host shown as an example in the setup form.
pub const HOST_PLACEHOLDER: &str = "192.168.1.1";

// ── Forms ────────────────────────────────────────────────────────

/// One input of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub default: String,
    /// Masked input; the default is never echoed back.
    pub secret: bool,
}

impl FormField {
    fn text(name: &'static str, default: impl Into<String>) -> Self {
        Self {
            name,
            default: default.into(),
            secret: false,
        }
    }

    fn secret(name: &'static str) -> Self {
        Self {
            name,
            default: String::new(),
            secret: true,
        }
    }
}

/// A form the host should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowForm {
    pub step_id: &'static str,
    pub fields: Vec<FormField>,
    /// Field name (or `"base"`) -> error code.
    pub errors: BTreeMap<String, String>,
    pub placeholders: BTreeMap<String, String>,
}

impl FlowForm {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn base_error(&self) -> Option<&str> {
        self.errors.get("base").map(String::as_str)
    }
}

// ── Config flow ──────────────────────────────────────────────────

/// Values submitted in the `user` step.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub host: String,
    pub username: String,
    pub password: SecretString,
}

impl UserInput {
    fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    fn entry_data(&self) -> EntryData {
        EntryData {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Outcome of a config flow step.
#[derive(Debug, Clone)]
pub enum ConfigFlowResult {
    Form(FlowForm),
    CreateEntry {
        title: String,
        unique_id: String,
        data: EntryData,
    },
    /// The switch already has an entry; `updates` carries the newly
    /// entered credentials for that entry.
    Abort {
        reason: &'static str,
        entry_id: String,
        updates: EntryData,
    },
}

/// Lookup of already configured switches.
pub trait ConfiguredEntries {
    /// Entry id of the entry bound to `unique_id`, if any.
    fn entry_for_unique_id(&self, unique_id: &str) -> Option<String>;
}

impl ConfiguredEntries for [ConfigEntry] {
    fn entry_for_unique_id(&self, unique_id: &str) -> Option<String> {
        self.iter()
            .find(|e| e.unique_id.as_deref() == Some(unique_id))
            .map(|e| e.entry_id.clone())
    }
}

/// Interactive setup of a new switch.
pub struct ConfigFlow {
    factory: Arc<dyn ConnectorFactory>,
    timeout: Duration,
}

impl ConfigFlow {
    pub fn new(factory: Arc<dyn ConnectorFactory>) -> Self {
        Self {
            factory,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle the `user` step.
    pub async fn step_user(
        &self,
        input: Option<UserInput>,
        existing: &(impl ConfiguredEntries + ?Sized),
    ) -> ConfigFlowResult {
        let Some(input) = input else {
            return ConfigFlowResult::Form(user_form(None, BTreeMap::new()));
        };

        let session = match DeviceSession::authenticate(
            Arc::clone(&self.factory),
            input.credentials(),
            self.timeout,
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                let code = e.form_error_code();
                if matches!(e, CoreError::AuthenticationFailed { .. }) {
                    debug!(host = %input.host, "switch rejected credentials");
                } else {
                    error!(host = %input.host, error = %e, "error connecting to switch");
                }
                let errors = BTreeMap::from([("base".to_owned(), code.to_owned())]);
                return ConfigFlowResult::Form(user_form(Some(&input), errors));
            }
        };

        let unique_id = session.unique_id().to_owned();
        if let Some(entry_id) = existing.entry_for_unique_id(&unique_id) {
            debug!(unique_id = %unique_id, entry_id = %entry_id, "switch already configured");
            return ConfigFlowResult::Abort {
                reason: ABORT_ALREADY_CONFIGURED,
                entry_id,
                updates: input.entry_data(),
            };
        }

        ConfigFlowResult::CreateEntry {
            title: format!("{} ({})", session.model(), input.host),
            unique_id,
            data: input.entry_data(),
        }
    }
}

fn user_form(previous: Option<&UserInput>, errors: BTreeMap<String, String>) -> FlowForm {
    let (host, username) = previous.map_or(("", DEFAULT_USERNAME), |p| {
        (p.host.as_str(), p.username.as_str())
    });
    FlowForm {
        step_id: STEP_USER,
        fields: vec![
            FormField::text("host", host),
            FormField::text("username", username),
            FormField::secret("password"),
        ],
        errors,
        placeholders: BTreeMap::from([("host".to_owned(), HOST_PLACEHOLDER.to_owned())]),
    }
}

// ── Options flow ─────────────────────────────────────────────────

/// Values submitted in the `init` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsInput {
    pub scan_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsFlowResult {
    Form(FlowForm),
    CreateEntry(EntryOptions),
}

/// Tuning of an existing entry.
pub struct OptionsFlow {
    current: EntryOptions,
}

impl OptionsFlow {
    pub fn new(current: EntryOptions) -> Self {
        Self { current }
    }

    pub fn step_init(&self, input: Option<OptionsInput>) -> OptionsFlowResult {
        let Some(input) = input else {
            return OptionsFlowResult::Form(self.form(BTreeMap::new()));
        };

        if input.scan_interval_secs < MIN_SCAN_INTERVAL_SECS {
            let errors = BTreeMap::from([(
                "scan_interval".to_owned(),
                "scan_interval_too_short".to_owned(),
            )]);
            return OptionsFlowResult::Form(self.form(errors));
        }

        OptionsFlowResult::CreateEntry(EntryOptions {
            scan_interval_secs: Some(input.scan_interval_secs),
        })
    }

    fn form(&self, errors: BTreeMap<String, String>) -> FlowForm {
        let current = self
            .current
            .scan_interval_secs
            .unwrap_or(DEFAULT_SCAN_INTERVAL.as_secs());
        FlowForm {
            step_id: STEP_INIT,
            fields: vec![FormField::text("scan_interval", current.to_string())],
            errors,
            placeholders: BTreeMap::new(),
        }
    }
}
