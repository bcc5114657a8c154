// ── Device identity ──
//
// Resolved once at setup and immutable afterwards. The unique id
// namespaces every entity identity string and the registry record.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{DOMAIN, MANUFACTURER};
use crate::error::CoreError;

/// Who a configured switch is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub unique_id: String,
    pub display_name: String,
    /// Autodetected model name, `"Unknown"` when detection failed.
    pub model: String,
    pub host: String,
}

impl DeviceIdentity {
    /// Stable identity string of the entity projecting `key`.
    pub fn entity_unique_id(&self, key: &str, index: u32) -> String {
        format!("{}-{key}-{index}", self.unique_id)
    }

    /// Build the device registry record for this switch.
    pub fn device_record(&self) -> Result<DeviceRecord, CoreError> {
        let config_url = Url::parse(&format!("http://{}/", self.host)).map_err(|e| {
            CoreError::Config {
                message: format!("invalid switch host '{}': {e}", self.host),
            }
        })?;

        Ok(DeviceRecord {
            domain: DOMAIN.into(),
            unique_id: self.unique_id.clone(),
            manufacturer: MANUFACTURER.into(),
            model: self.model.clone(),
            name: self.display_name.clone(),
            config_url,
        })
    }
}

/// Device registry record handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub domain: String,
    pub unique_id: String,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    pub config_url: Url,
}
