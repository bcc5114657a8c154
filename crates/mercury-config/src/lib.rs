//! Config entry persistence for the Mercury switch integration.
//!
//! Entries live in one TOML file, layered with `MERCURY_`-prefixed
//! environment variables. This crate resolves each entry's password and
//! translates it into a `mercury_core::ConfigEntry`, and records the
//! outcome of config and options flows back into the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use mercury_core::config::{DEFAULT_USERNAME, MIN_SCAN_INTERVAL_SECS};
use mercury_core::{ConfigEntry, ConfigFlowResult, ConfiguredEntries, EntryData, EntryOptions};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for entry '{entry_id}'")]
    NoCredentials { entry_id: String },

    #[error("unknown config entry '{entry_id}'")]
    UnknownEntry { entry_id: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Values applied to entries that leave them unset.
    #[serde(default)]
    pub defaults: Defaults,

    /// Config entries keyed by entry id.
    #[serde(default)]
    pub entries: BTreeMap<String, StoredEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Defaults {
    /// Poll period in seconds for entries without their own.
    pub scan_interval_secs: Option<u64>,
}

/// One configured switch.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoredEntry {
    #[serde(default)]
    pub title: String,

    /// Stable switch id, set by the config flow.
    pub unique_id: Option<String>,

    /// Hostname or IP address of the switch.
    pub host: String,

    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password (prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    #[serde(default)]
    pub options: StoredOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredOptions {
    pub scan_interval_secs: Option<u64>,
}

fn default_username() -> String {
    DEFAULT_USERNAME.into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "mercury", "mercury-switch")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mercury-switch");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where last-known sensor values are kept between runs.
pub fn restore_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("restore.json"),
        |dirs| dirs.data_dir().join("restore.json"),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` plus environment. A missing file yields
/// the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MERCURY_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), entries = config.entries.len(), "loaded config");
    Ok(config)
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an entry's password from the process environment.
pub fn resolve_password(entry: &StoredEntry, entry_id: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(entry, entry_id, |name| std::env::var(name).ok())
}

/// Resolve an entry's password: `password_env` first, then plaintext.
pub fn resolve_password_with(
    entry: &StoredEntry,
    entry_id: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(ref env_name) = entry.password_env {
        if let Some(val) = lookup(env_name) {
            return Ok(SecretString::from(val));
        }
        debug!(entry_id, env = %env_name, "password variable not set, trying plaintext");
    }

    // 2. Plaintext in config
    if let Some(ref pw) = entry.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        entry_id: entry_id.into(),
    })
}

// ── Translation to core types ───────────────────────────────────────

impl Config {
    pub fn entry(&self, entry_id: &str) -> Result<&StoredEntry, ConfigError> {
        self.entries
            .get(entry_id)
            .ok_or_else(|| ConfigError::UnknownEntry {
                entry_id: entry_id.into(),
            })
    }

    /// Build the core entry for `entry_id`, resolving the password from
    /// the process environment.
    pub fn to_config_entry(&self, entry_id: &str) -> Result<ConfigEntry, ConfigError> {
        self.to_config_entry_with(entry_id, |name| std::env::var(name).ok())
    }

    pub fn to_config_entry_with(
        &self,
        entry_id: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ConfigEntry, ConfigError> {
        let stored = self.entry(entry_id)?;
        if stored.host.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "host".into(),
                reason: format!("entry '{entry_id}' has an empty host"),
            });
        }
        let password = resolve_password_with(stored, entry_id, lookup)?;

        Ok(ConfigEntry {
            entry_id: entry_id.to_owned(),
            title: stored.title.clone(),
            unique_id: stored.unique_id.clone(),
            data: EntryData {
                host: stored.host.clone(),
                username: stored.username.clone(),
                password,
            },
            options: EntryOptions {
                scan_interval_secs: stored
                    .options
                    .scan_interval_secs
                    .or(self.defaults.scan_interval_secs),
            },
        })
    }

    /// Every entry, in entry id order.
    pub fn config_entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        self.entries
            .keys()
            .map(|id| self.to_config_entry(id))
            .collect()
    }

    // ── Flow results ────────────────────────────────────────────────

    /// Record a finished config flow.
    ///
    /// A created entry gets a fresh id; an `already_configured` abort
    /// updates the credentials of the existing entry. Returns the id of
    /// the entry written, or `None` when the flow is still showing a form.
    pub fn apply_flow_result(
        &mut self,
        result: &ConfigFlowResult,
    ) -> Result<Option<String>, ConfigError> {
        match result {
            ConfigFlowResult::Form(_) => Ok(None),
            ConfigFlowResult::CreateEntry {
                title,
                unique_id,
                data,
            } => {
                let entry_id = uuid::Uuid::new_v4().simple().to_string();
                self.entries.insert(
                    entry_id.clone(),
                    StoredEntry {
                        title: title.clone(),
                        unique_id: Some(unique_id.clone()),
                        host: data.host.clone(),
                        username: data.username.clone(),
                        password: Some(data.password.expose_secret().to_owned()),
                        password_env: None,
                        options: StoredOptions::default(),
                    },
                );
                debug!(entry_id = %entry_id, title = %title, "created config entry");
                Ok(Some(entry_id))
            }
            ConfigFlowResult::Abort {
                entry_id, updates, ..
            } => {
                let stored =
                    self.entries
                        .get_mut(entry_id)
                        .ok_or_else(|| ConfigError::UnknownEntry {
                            entry_id: entry_id.clone(),
                        })?;
                stored.host.clone_from(&updates.host);
                stored.username.clone_from(&updates.username);
                stored.password = Some(updates.password.expose_secret().to_owned());
                debug!(entry_id = %entry_id, "updated credentials of existing entry");
                Ok(Some(entry_id.clone()))
            }
        }
    }

    /// Record the outcome of an options flow.
    pub fn apply_options(
        &mut self,
        entry_id: &str,
        options: &EntryOptions,
    ) -> Result<(), ConfigError> {
        if let Some(secs) = options.scan_interval_secs {
            if secs < MIN_SCAN_INTERVAL_SECS {
                return Err(ConfigError::Validation {
                    field: "scan_interval_secs".into(),
                    reason: format!("must be at least {MIN_SCAN_INTERVAL_SECS}s, got {secs}s"),
                });
            }
        }
        let stored = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigError::UnknownEntry {
                entry_id: entry_id.into(),
            })?;
        stored.options.scan_interval_secs = options.scan_interval_secs;
        Ok(())
    }
}

impl ConfiguredEntries for Config {
    fn entry_for_unique_id(&self, unique_id: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(_, e)| e.unique_id.as_deref() == Some(unique_id))
            .map(|(id, _)| id.clone())
    }
}
