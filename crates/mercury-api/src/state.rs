// ── Flat switch state ──
//
// One fetch returns the whole device state as a single flat map. Keys
// follow fixed grammars (`port_{n}_status`, `vlan_{id}_name`, ...), so
// consumers address fields by key rather than through nested structs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::SwitchValue;

/// Complete raw switch status from a single fetch, keyed by field name.
///
/// Insertion order follows the vendor client's output, which keeps
/// key-driven enumeration (e.g. VLAN discovery) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchState(IndexMap<String, SwitchValue>);

impl SwitchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SwitchValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a value, returning the previous value under that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SwitchValue>,
    ) -> Option<SwitchValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SwitchValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<SwitchValue>> FromIterator<(K, V)> for SwitchState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<IndexMap<String, SwitchValue>> for SwitchState {
    fn from(map: IndexMap<String, SwitchValue>) -> Self {
        Self(map)
    }
}
