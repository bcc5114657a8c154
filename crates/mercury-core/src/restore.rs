// ── Restore store ──
//
// Sensors show their last-seen value across restarts until the next
// successful poll overwrites it. Values are keyed by entity unique id,
// so one store can serve several config entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::debug;

use mercury_api::SwitchValue;

use crate::error::CoreError;

/// Persisted last-known sensor values.
pub trait RestoreStore: Send + Sync {
    fn last_value(&self, unique_id: &str) -> Option<SwitchValue>;

    /// Record values; a `None` value forgets the entity.
    fn persist(&self, values: &[(String, Option<SwitchValue>)]) -> Result<(), CoreError>;
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRestoreStore {
    values: DashMap<String, SwitchValue>,
}

impl MemoryRestoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, values: &[(String, Option<SwitchValue>)]) {
        for (id, value) in values {
            match value {
                Some(v) => {
                    self.values.insert(id.clone(), v.clone());
                }
                None => {
                    self.values.remove(id);
                }
            }
        }
    }
}

impl RestoreStore for MemoryRestoreStore {
    fn last_value(&self, unique_id: &str) -> Option<SwitchValue> {
        self.values.get(unique_id).map(|v| v.value().clone())
    }

    fn persist(&self, values: &[(String, Option<SwitchValue>)]) -> Result<(), CoreError> {
        self.apply(values);
        Ok(())
    }
}

// ── JSON file ────────────────────────────────────────────────────────

/// File-backed store: a single JSON object of unique id -> value.
#[derive(Debug)]
pub struct JsonRestoreStore {
    path: PathBuf,
    cache: MemoryRestoreStore,
}

impl JsonRestoreStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let cache = MemoryRestoreStore::new();

        match std::fs::read_to_string(&path) {
            Ok(body) => {
                let values: BTreeMap<String, SwitchValue> =
                    serde_json::from_str(&body).map_err(|e| CoreError::Persistence {
                        message: format!("corrupt restore file {}: {e}", path.display()),
                    })?;
                debug!(path = %path.display(), entries = values.len(), "loaded restore state");
                for (id, value) in values {
                    cache.values.insert(id, value);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CoreError::Persistence {
                    message: format!("cannot read {}: {e}", path.display()),
                });
            }
        }

        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full cache via a temp file + rename.
    fn flush(&self) -> Result<(), CoreError> {
        let sorted: BTreeMap<String, SwitchValue> = self
            .cache
            .values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let body = serde_json::to_string_pretty(&sorted).map_err(|e| CoreError::Persistence {
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(&self.path))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> CoreError + '_ {
    move |e| CoreError::Persistence {
        message: format!("cannot write {}: {e}", path.display()),
    }
}

impl RestoreStore for JsonRestoreStore {
    fn last_value(&self, unique_id: &str) -> Option<SwitchValue> {
        self.cache.last_value(unique_id)
    }

    fn persist(&self, values: &[(String, Option<SwitchValue>)]) -> Result<(), CoreError> {
        self.cache.apply(values);
        self.flush()
    }
}
