// Scripted fake switch shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use secrecy::SecretString;

use mercury_api::{
    ConnectorFactory, Credentials, Error, SwitchConnector, SwitchModel, SwitchState, SwitchValue,
};
use mercury_core::{ConfigEntry, EntryData, EntryOptions};

pub const HOST: &str = "192.168.1.100";
pub const UNIQUE_ID: &str = "sg108pro_192_168_1_100";
pub const TITLE: &str = "SG108Pro (192.168.1.100)";

/// How the fake switch behaves. Tests mutate it between calls.
pub struct Behavior {
    pub model: &'static str,
    pub autodetect_fails: bool,
    pub accept_login: bool,
    pub unique_id: String,
    pub port_count: u16,
    /// One-shot failure of the next `connect`.
    pub connect_error: Option<Error>,
    pub unique_id_error: Option<Error>,
    /// Scripted fetch results, consumed in order.
    pub fetches: VecDeque<Result<SwitchState, Error>>,
    /// Returned once the script runs dry.
    pub steady_state: SwitchState,
    pub fetch_delay: Option<Duration>,
    pub fetch_count: usize,
    pub connect_count: usize,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            model: "SG108Pro",
            autodetect_fails: false,
            accept_login: true,
            unique_id: UNIQUE_ID.into(),
            port_count: 8,
            connect_error: None,
            unique_id_error: None,
            fetches: VecDeque::new(),
            steady_state: example_state(),
            fetch_delay: None,
            fetch_count: 0,
            connect_count: 0,
        }
    }
}

/// Handle to a fake switch; clones share behavior.
#[derive(Clone, Default)]
pub struct FakeSwitch {
    behavior: Arc<Mutex<Behavior>>,
}

impl FakeSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn behavior(&self) -> MutexGuard<'_, Behavior> {
        self.behavior.lock().unwrap()
    }

    pub fn push_state(&self, state: SwitchState) {
        self.behavior().fetches.push_back(Ok(state));
    }

    pub fn push_error(&self, error: Error) {
        self.behavior().fetches.push_back(Err(error));
    }

    pub fn fetch_count(&self) -> usize {
        self.behavior().fetch_count
    }

    pub fn factory(&self) -> Arc<dyn ConnectorFactory> {
        Arc::new(self.clone())
    }
}

impl ConnectorFactory for FakeSwitch {
    fn connect(&self, _credentials: &Credentials) -> Result<Box<dyn SwitchConnector>, Error> {
        let mut b = self.behavior();
        b.connect_count += 1;
        if let Some(e) = b.connect_error.take() {
            return Err(e);
        }
        Ok(Box::new(FakeConnector {
            switch: self.clone(),
            model: SwitchModel::unknown(),
        }))
    }
}

struct FakeConnector {
    switch: FakeSwitch,
    model: SwitchModel,
}

impl SwitchConnector for FakeConnector {
    fn autodetect_model(&mut self) -> Result<(), Error> {
        let b = self.switch.behavior();
        if b.autodetect_fails {
            return Err(Error::Protocol {
                message: "model page not recognised".into(),
            });
        }
        self.model = SwitchModel::new(b.model);
        Ok(())
    }

    fn model(&self) -> SwitchModel {
        self.model.clone()
    }

    fn login(&mut self) -> Result<bool, Error> {
        Ok(self.switch.behavior().accept_login)
    }

    fn unique_id(&mut self) -> Result<String, Error> {
        let mut b = self.switch.behavior();
        match b.unique_id_error.take() {
            Some(e) => Err(e),
            None => Ok(b.unique_id.clone()),
        }
    }

    fn port_count(&self) -> u16 {
        self.switch.behavior().port_count
    }

    fn fetch_state(&mut self) -> Result<SwitchState, Error> {
        let delay = {
            let mut b = self.switch.behavior();
            b.fetch_count += 1;
            b.fetch_delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let mut b = self.switch.behavior();
        match b.fetches.pop_front() {
            Some(result) => result,
            None => Ok(b.steady_state.clone()),
        }
    }
}

/// Route `tracing` output to the test harness; `RUST_LOG` filters it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Fixtures ────────────────────────────────────────────────────────

/// Ports 1, 2 and 4 reported; VLANs 1 and 10 configured.
pub fn example_state() -> SwitchState {
    [
        ("switch_firmware", SwitchValue::from("1.0.0 Build 20180515")),
        ("switch_hardware", SwitchValue::from("SG108Pro 1.0")),
        ("switch_mac", SwitchValue::from("00:11:22:33:44:55")),
        ("switch_ip", SwitchValue::from(HOST)),
        ("port_1_status", SwitchValue::from("on")),
        ("port_1_speed", SwitchValue::from("1000M")),
        ("port_1_tx_good", SwitchValue::from(1_000)),
        ("port_1_rx_good", SwitchValue::from(2_000)),
        ("port_2_status", SwitchValue::from("off")),
        ("port_4_status", SwitchValue::from("on")),
        ("vlan_type", SwitchValue::from("802.1Q")),
        ("vlan_enabled", SwitchValue::from(true)),
        ("vlan_count", SwitchValue::from(7)),
        ("vlan_1_name", SwitchValue::from("Default")),
        ("vlan_10_name", SwitchValue::from("VLAN10")),
        ("vlan_10_tagged_ports", SwitchValue::from("1, 7")),
    ]
    .into_iter()
    .collect()
}

pub fn entry(unique_id: Option<&str>) -> ConfigEntry {
    ConfigEntry {
        entry_id: "entry-1".into(),
        title: TITLE.into(),
        unique_id: unique_id.map(str::to_owned),
        data: EntryData {
            host: HOST.into(),
            username: "admin".into(),
            password: SecretString::from("secret"),
        },
        options: EntryOptions::default(),
    }
}

pub fn entity_id(key: &str) -> String {
    format!("{UNIQUE_ID}-{key}-0")
}
