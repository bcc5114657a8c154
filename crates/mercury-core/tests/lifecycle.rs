// Integration tests for `SwitchIntegration` setup, polling and unload.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use mercury_api::{Error, SwitchState, SwitchValue};
use mercury_core::{
    CoreError, EntityKind, EntryOptions, Host, JsonRestoreStore, MemoryHost, MemoryRestoreStore,
    PollPhase, RestoreStore, SetupError, SwitchIntegration,
};

use common::{entity_id, entry, example_state, FakeSwitch, HOST, TITLE, UNIQUE_ID};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(
    switch: &FakeSwitch,
    host: &Arc<MemoryHost>,
    restore: Arc<dyn RestoreStore>,
) -> Result<SwitchIntegration, SetupError> {
    common::init_tracing();
    SwitchIntegration::setup(
        entry(Some(UNIQUE_ID)),
        switch.factory(),
        Arc::clone(host) as Arc<dyn Host>,
        restore,
    )
    .await
}

async fn setup(switch: &FakeSwitch) -> (SwitchIntegration, Arc<MemoryHost>) {
    let host = Arc::new(MemoryHost::new());
    let integration = setup_with(switch, &host, Arc::new(MemoryRestoreStore::new()))
        .await
        .unwrap();
    (integration, host)
}

fn is_on(integration: &SwitchIntegration, key: &str) -> Option<bool> {
    integration.entities().get_by_key(key).unwrap().value.is_on()
}

fn native(integration: &SwitchIntegration, key: &str) -> Option<SwitchValue> {
    integration
        .entities()
        .get_by_key(key)
        .unwrap()
        .value
        .native_value()
        .cloned()
}

// ── Setup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn setup_registers_device_and_entities() {
    let switch = FakeSwitch::new();
    let (integration, host) = setup(&switch).await;

    // 4 identity + 8 status + 24 port sensors + 3 global VLAN + 2 VLANs x 3
    assert_eq!(integration.entities().len(), 45);
    assert_eq!(host.entity_ids("entry-1").len(), 45);

    let devices = host.devices();
    assert_eq!(devices.len(), 1);
    let device = &devices[0];
    assert_eq!(device.domain, "mercury_switch");
    assert_eq!(device.manufacturer, "Mercury");
    assert_eq!(device.unique_id, UNIQUE_ID);
    assert_eq!(device.model, "SG108Pro");
    assert_eq!(device.name, TITLE);
    assert_eq!(device.config_url.as_str(), format!("http://{HOST}/"));
    assert_eq!(integration.device_record(), device);

    assert_eq!(switch.fetch_count(), 1);
    let status = integration.scheduler().status();
    assert_eq!(status.phase, PollPhase::Idle);
    assert!(status.last_update_success);
    assert!(integration.scheduler().is_running().await);
}

#[tokio::test]
async fn port_status_follows_example_map() {
    let switch = FakeSwitch::new();
    let (integration, _host) = setup(&switch).await;

    assert_eq!(is_on(&integration, "port_1_status"), Some(true));
    assert_eq!(is_on(&integration, "port_2_status"), Some(false));
    assert_eq!(is_on(&integration, "port_4_status"), Some(true));
    for port in [3, 5, 6, 7, 8] {
        assert_eq!(
            is_on(&integration, &format!("port_{port}_status")),
            Some(false),
            "port {port}"
        );
    }
}

#[tokio::test]
async fn vlan_entities_and_unknown_values() {
    let switch = FakeSwitch::new();
    let (integration, _host) = setup(&switch).await;

    assert_eq!(
        native(&integration, "vlan_10_tagged_ports"),
        Some(SwitchValue::from("1, 7"))
    );
    assert_eq!(native(&integration, "vlan_1_name"), Some(SwitchValue::from("Default")));
    // Discovered ids always get all three entities; absent keys are unknown.
    assert_eq!(native(&integration, "vlan_10_untagged_ports"), None);
    assert_eq!(native(&integration, "vlan_1_tagged_ports"), None);
    assert_eq!(native(&integration, "port_3_speed"), None);

    let firmware = integration.entities().get(&entity_id("switch_firmware")).unwrap();
    assert_eq!(firmware.name, format!("{TITLE} Firmware"));
    assert_eq!(firmware.descriptor.kind, EntityKind::Sensor);
}

#[tokio::test]
async fn missing_unique_id_is_terminal() {
    let switch = FakeSwitch::new();
    let err = SwitchIntegration::setup(
        entry(None),
        switch.factory(),
        Arc::new(MemoryHost::new()),
        Arc::new(MemoryRestoreStore::new()),
    )
    .await
    .err()
    .unwrap();

    assert!(matches!(err, SetupError::Failed(CoreError::MissingUniqueId { .. })));
    assert_eq!(switch.behavior().connect_count, 0);
}

#[tokio::test]
async fn rejected_login_is_terminal() {
    let switch = FakeSwitch::new();
    switch.behavior().accept_login = false;
    let host = Arc::new(MemoryHost::new());

    let err = setup_with(&switch, &host, Arc::new(MemoryRestoreStore::new()))
        .await
        .err()
        .unwrap();

    assert!(matches!(
        err,
        SetupError::Failed(CoreError::AuthenticationFailed { .. })
    ));
    assert!(host.devices().is_empty());
}

#[tokio::test]
async fn unreachable_switch_defers_setup() {
    let switch = FakeSwitch::new();
    switch.behavior().connect_error = Some(Error::Connection {
        host: HOST.into(),
        reason: "connection refused".into(),
    });

    let err = setup_with(
        &switch,
        &Arc::new(MemoryHost::new()),
        Arc::new(MemoryRestoreStore::new()),
    )
    .await
    .err()
    .unwrap();

    assert!(matches!(
        err,
        SetupError::NotReady(CoreError::ConnectionFailed { .. })
    ));
}

#[tokio::test]
async fn failed_first_poll_defers_setup() {
    let switch = FakeSwitch::new();
    switch.push_error(Error::Timeout { timeout_secs: 15 });
    let host = Arc::new(MemoryHost::new());

    let err = setup_with(&switch, &host, Arc::new(MemoryRestoreStore::new()))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, SetupError::NotReady(CoreError::Timeout { .. })));
    // The device record goes in before the first refresh.
    assert_eq!(host.devices().len(), 1);
    assert!(host.entity_ids("entry-1").is_empty());
}

#[tokio::test]
async fn autodetect_failure_still_sets_up() {
    let switch = FakeSwitch::new();
    switch.behavior().autodetect_fails = true;
    let (integration, _host) = setup(&switch).await;
    assert_eq!(integration.identity().model, "Unknown");
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn status_flips_between_cycles() {
    let switch = FakeSwitch::new();
    let (integration, _host) = setup(&switch).await;
    assert_eq!(is_on(&integration, "port_1_status"), Some(true));

    let mut next = example_state();
    next.insert("port_1_status", "off");
    next.insert("port_1_tx_good", 1_500);
    switch.push_state(next);

    integration.scheduler().refresh().await.unwrap();
    assert_eq!(is_on(&integration, "port_1_status"), Some(false));
    assert_eq!(native(&integration, "port_1_tx_good"), Some(SwitchValue::Int(1_500)));

    switch.push_state(example_state());
    integration.scheduler().refresh().await.unwrap();
    assert_eq!(is_on(&integration, "port_1_status"), Some(true));
}

#[tokio::test]
async fn failed_poll_keeps_last_good_state() {
    let switch = FakeSwitch::new();
    let (integration, _host) = setup(&switch).await;
    let before = integration.scheduler().data().unwrap();
    let version = integration.entities().version();

    switch.push_error(Error::Connection {
        host: HOST.into(),
        reason: "reset by peer".into(),
    });
    let err = integration.scheduler().refresh().await.unwrap_err();
    assert!(err.is_retryable());

    let status = integration.scheduler().status();
    assert_eq!(status.phase, PollPhase::Idle);
    assert!(!status.last_update_success);
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.last_error.is_some());

    assert_eq!(integration.scheduler().data().unwrap(), before);
    assert_eq!(integration.entities().version(), version);
    assert_eq!(is_on(&integration, "port_1_status"), Some(true));

    integration.scheduler().refresh().await.unwrap();
    let status = integration.scheduler().status();
    assert_eq!(status.consecutive_failures, 0);
    assert!(status.last_success_at.is_some());
}

#[tokio::test]
async fn subscribers_see_each_cycle() {
    let switch = FakeSwitch::new();
    let (integration, _host) = setup(&switch).await;
    let mut entities = integration.entities().subscribe();

    let mut next = example_state();
    next.insert("port_2_status", "ON");
    switch.push_state(next);
    integration.scheduler().refresh().await.unwrap();

    entities.changed().await.unwrap();
    let snap = entities.borrow_and_update().clone();
    let port2 = snap
        .iter()
        .find(|e| e.descriptor.key == "port_2_status")
        .unwrap();
    assert_eq!(port2.value.is_on(), Some(true));
}

// ── Unload / restore / reload ───────────────────────────────────────

#[tokio::test]
async fn unload_persists_sensor_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restore.json");
    let switch = FakeSwitch::new();
    let host = Arc::new(MemoryHost::new());

    let store = Arc::new(JsonRestoreStore::open(&path).unwrap());
    let integration = setup_with(&switch, &host, store).await.unwrap();
    integration.unload().await.unwrap();

    assert!(host.entity_ids("entry-1").is_empty());

    let reopened = JsonRestoreStore::open(&path).unwrap();
    assert_eq!(
        reopened.last_value(&entity_id("switch_firmware")),
        Some(SwitchValue::from("1.0.0 Build 20180515"))
    );
    assert_eq!(
        reopened.last_value(&entity_id("port_1_tx_good")),
        Some(SwitchValue::Int(1_000))
    );
    assert_eq!(reopened.last_value(&entity_id("port_1_status")), None);
}

#[tokio::test]
async fn first_poll_wins_over_persisted_values() {
    let store: Arc<dyn RestoreStore> = Arc::new(MemoryRestoreStore::new());
    let switch = FakeSwitch::new();
    let host = Arc::new(MemoryHost::new());

    let integration = setup_with(&switch, &host, Arc::clone(&store)).await.unwrap();
    integration.unload().await.unwrap();
    assert_eq!(
        store.last_value(&entity_id("port_1_tx_good")),
        Some(SwitchValue::Int(1_000))
    );

    // After the restart the switch reports a new counter and no firmware.
    let mut state: SwitchState = example_state()
        .iter()
        .filter(|(k, _)| *k != "switch_firmware")
        .map(|(k, v)| (k, v.clone()))
        .collect();
    state.insert("port_1_tx_good", 2_000);
    switch.behavior().steady_state = state;

    let integration = setup_with(&switch, &host, store).await.unwrap();

    let registered = host.entities("entry-1");
    let value_of = |key: &str| {
        registered
            .iter()
            .find(|e| e.descriptor.key == key)
            .unwrap()
            .value
            .native_value()
            .cloned()
    };
    assert_eq!(value_of("port_1_tx_good"), Some(SwitchValue::Int(2_000)));
    assert_eq!(value_of("switch_firmware"), None);
    assert_eq!(native(&integration, "switch_firmware"), None);
}

#[tokio::test]
async fn options_update_reloads_entry() {
    let switch = FakeSwitch::new();
    let (integration, host) = setup(&switch).await;
    assert_eq!(
        integration.scheduler().config().scan_interval,
        Duration::from_secs(30)
    );

    let reloaded = integration
        .options_updated(EntryOptions {
            scan_interval_secs: Some(60),
        })
        .await
        .unwrap();

    assert_eq!(
        reloaded.scheduler().config().scan_interval,
        Duration::from_secs(60)
    );
    assert_eq!(reloaded.entry().options.scan_interval_secs, Some(60));
    assert_eq!(switch.behavior().connect_count, 2);
    assert_eq!(host.entity_ids("entry-1").len(), 45);
    assert!(reloaded.scheduler().is_running().await);
}
