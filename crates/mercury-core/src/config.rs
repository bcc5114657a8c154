// ── Config entry and runtime tuning ──
//
// A config entry is what the host persists for one configured switch:
// the credential triple, the resolved unique id, and user options.
// Core never reads or writes files; `mercury-config` owns the on-disk
// format and hands a `ConfigEntry` in.

use std::time::Duration;

use secrecy::SecretString;

use mercury_api::Credentials;

/// Integration domain, used to namespace device registry records.
pub const DOMAIN: &str = "mercury_switch";

/// Manufacturer shown in the device registry.
pub const MANUFACTURER: &str = "Mercury";

/// Title used when an entry has none.
pub const DEFAULT_NAME: &str = "Mercury Switch";

/// Username pre-filled in the setup form.
pub const DEFAULT_USERNAME: &str = "admin";

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Lower bound accepted by the options flow.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 5;

/// Persisted connection data of a config entry.
#[derive(Debug, Clone)]
pub struct EntryData {
    pub host: String,
    pub username: String,
    pub password: SecretString,
}

impl EntryData {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// User-adjustable options of a config entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Poll period override in seconds. `None` = default.
    pub scan_interval_secs: Option<u64>,
}

/// One configured switch, as persisted by the host.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub entry_id: String,
    /// Display title, e.g. `"SG108Pro (192.168.1.100)"`.
    pub title: String,
    /// Stable switch id, resolved by the config flow.
    pub unique_id: Option<String>,
    pub data: EntryData,
    pub options: EntryOptions,
}

impl ConfigEntry {
    /// Device name shown to users; falls back to [`DEFAULT_NAME`].
    pub fn device_name(&self) -> &str {
        if self.title.is_empty() {
            DEFAULT_NAME
        } else {
            &self.title
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::from(&self.options)
    }
}

/// Timing of the poll scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Period between poll cycles.
    pub scan_interval: Duration,
    /// Upper bound on a single fetch; a timed-out fetch fails the cycle.
    pub fetch_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl From<&EntryOptions> for PollConfig {
    fn from(options: &EntryOptions) -> Self {
        let scan_interval = options
            .scan_interval_secs
            .map_or(DEFAULT_SCAN_INTERVAL, |secs| {
                Duration::from_secs(secs.max(MIN_SCAN_INTERVAL_SECS))
            });
        Self {
            scan_interval,
            ..Self::default()
        }
    }
}
