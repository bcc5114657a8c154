// ── Entity catalog ──
//
// Enumerates every entity a switch exposes: identity sensors, a block of
// templates per physical port, global VLAN sensors, and a block of
// templates per VLAN id discovered in the first flat map. The template
// tables are static and order-preserving; the output order is the
// registration order.

use indexmap::IndexSet;
use tracing::{debug, info};

use mercury_api::{SwitchState, SwitchValue};

use crate::model::{DeviceClass, EntityCategory, EntityDescriptor, Extractor, StateClass};

/// One row of a static template table.
struct Template {
    /// Key fragment; the full key is built by the owning group.
    key: &'static str,
    label: &'static str,
    extractor: Extractor,
    icon: Option<&'static str>,
    unit: Option<&'static str>,
    state_class: Option<StateClass>,
}

impl Template {
    const fn text(key: &'static str, label: &'static str, icon: &'static str) -> Self {
        Self {
            key,
            label,
            extractor: Extractor::Identity,
            icon: Some(icon),
            unit: None,
            state_class: None,
        }
    }

    const fn counter(key: &'static str, label: &'static str, icon: &'static str) -> Self {
        Self {
            key,
            label,
            extractor: Extractor::Numeric,
            icon: Some(icon),
            unit: Some("packets"),
            state_class: Some(StateClass::TotalIncreasing),
        }
    }

    fn descriptor(&self, key: String, name: String) -> EntityDescriptor {
        let mut d = match self.extractor {
            Extractor::Boolean => EntityDescriptor::binary(key, name),
            Extractor::Numeric => EntityDescriptor::numeric(key, name),
            Extractor::Identity => EntityDescriptor::sensor(key, name),
        };
        d.icon = self.icon.map(str::to_owned);
        d.unit = self.unit.map(str::to_owned);
        d.state_class = self.state_class;
        d
    }
}

// ── Template tables ──────────────────────────────────────────────────

const IDENTITY_SENSORS: [Template; 4] = [
    Template::text("switch_firmware", "Firmware", "mdi:text"),
    Template::text("switch_hardware", "Hardware", "mdi:text"),
    Template::text("switch_mac", "MAC Address", "mdi:network"),
    Template::text("switch_ip", "IP Address", "mdi:ip-network"),
];

/// Per-port sensors; keys are `port_{n}_{key}`, names `Port {n} {label}`.
const PORT_SENSORS: [Template; 3] = [
    Template::text("speed", "Speed", "mdi:speedometer"),
    Template::counter("tx_good", "TX Packets", "mdi:upload"),
    Template::counter("rx_good", "RX Packets", "mdi:download"),
];

const VLAN_GLOBAL_SENSORS: [Template; 3] = [
    Template::text("vlan_type", "VLAN Type", "mdi:tag"),
    Template::text("vlan_enabled", "802.1Q VLAN Enabled", "mdi:tag"),
    Template::text("vlan_count", "VLAN Count", "mdi:tag-multiple"),
];

/// Per-VLAN sensors; keys are `vlan_{id}_{key}`, names `VLAN {id} {label}`.
const VLAN_SENSORS: [Template; 3] = [
    Template::text("name", "Name", "mdi:tag"),
    Template::text("tagged_ports", "Tagged Ports", "mdi:tag-multiple"),
    Template::text("untagged_ports", "Untagged Ports", "mdi:tag-outline"),
];

// ── Builder ──────────────────────────────────────────────────────────

/// Build the full entity catalog for a switch.
///
/// `port_count` comes from the identified device; VLAN ids are read from
/// `state` (the first successful fetch). Without a state, no per-VLAN
/// entities are emitted.
pub fn build_catalog(port_count: u16, state: Option<&SwitchState>) -> Vec<EntityDescriptor> {
    let vlan_ids = state.map(discover_vlan_ids).unwrap_or_default();
    let mut out = Vec::with_capacity(
        IDENTITY_SENSORS.len()
            + usize::from(port_count) * (1 + PORT_SENSORS.len())
            + VLAN_GLOBAL_SENSORS.len()
            + vlan_ids.len() * VLAN_SENSORS.len(),
    );

    out.extend(IDENTITY_SENSORS.iter().map(|t| {
        t.descriptor(t.key.to_owned(), t.label.to_owned())
            .with_category(EntityCategory::Diagnostic)
    }));

    for port in 1..=port_count {
        out.push(
            EntityDescriptor::binary(format!("port_{port}_status"), format!("Port {port} Status"))
                .with_device_class(DeviceClass::Connectivity),
        );
        out.extend(PORT_SENSORS.iter().map(|t| {
            t.descriptor(
                format!("port_{port}_{}", t.key),
                format!("Port {port} {}", t.label),
            )
        }));
    }

    out.extend(
        VLAN_GLOBAL_SENSORS
            .iter()
            .map(|t| t.descriptor(t.key.to_owned(), t.label.to_owned())),
    );

    for id in &vlan_ids {
        out.extend(VLAN_SENSORS.iter().map(|t| {
            t.descriptor(format!("vlan_{id}_{}", t.key), format!("VLAN {id} {}", t.label))
        }));
    }

    info!(
        ports = port_count,
        vlans = vlan_ids.len(),
        entities = out.len(),
        "built entity catalog"
    );
    out
}

/// Distinct VLAN ids that have a `vlan_{id}_name` key, in map order.
///
/// Returns nothing unless `vlan_count` is present and greater than zero.
/// Keys whose id token is not a signed decimal integer are skipped.
pub fn discover_vlan_ids(state: &SwitchState) -> Vec<i64> {
    let vlan_count = state.get("vlan_count").and_then(SwitchValue::as_i64).unwrap_or(0);
    if vlan_count <= 0 {
        return Vec::new();
    }

    let mut ids = IndexSet::new();
    for key in state.keys() {
        let Some(token) = key
            .strip_prefix("vlan_")
            .and_then(|rest| rest.strip_suffix("_name"))
        else {
            continue;
        };
        match token.parse::<i64>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) => debug!(key, "skipping VLAN key with malformed id"),
        }
    }
    ids.into_iter().collect()
}
