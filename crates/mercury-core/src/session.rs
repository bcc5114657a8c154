// ── Device session ──
//
// Owns the single vendor connector handle of one switch. The handle is
// stateful and non-reentrant, so every call takes the session lock and
// runs on the blocking executor while holding it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use mercury_api::{ConnectorFactory, Credentials, SwitchConnector, SwitchModel, SwitchState};

use crate::error::CoreError;

/// What authentication learned about the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub model: SwitchModel,
    pub unique_id: String,
    pub port_count: u16,
}

/// An authenticated connection to one switch.
///
/// Cheaply cloneable; clones share the same connector and lock.
#[derive(Clone)]
pub struct DeviceSession {
    host: String,
    info: SessionInfo,
    connector: Arc<Mutex<Box<dyn SwitchConnector>>>,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("host", &self.host)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl DeviceSession {
    /// Open a session, identify the switch, and log in.
    ///
    /// Model autodetection is best-effort: a failure is logged and the
    /// session continues with an unknown model. A rejected login fails
    /// with [`CoreError::AuthenticationFailed`]; transport failures and
    /// exceeding `timeout` fail with a retryable error.
    pub async fn authenticate(
        factory: Arc<dyn ConnectorFactory>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let host = credentials.host.clone();
        let task = tokio::task::spawn_blocking(move || open_session(&*factory, &credentials));

        let (connector, info) = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            })???;

        info!(
            host = %host,
            model = %info.model,
            port_count = info.port_count,
            "switch session established"
        );

        Ok(Self {
            host,
            info,
            connector: Arc::new(Mutex::new(connector)),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn unique_id(&self) -> &str {
        &self.info.unique_id
    }

    pub fn port_count(&self) -> u16 {
        self.info.port_count
    }

    pub fn model(&self) -> &SwitchModel {
        &self.info.model
    }

    /// Model and unique id resolved at authentication.
    pub fn identify(&self) -> (&SwitchModel, &str) {
        (&self.info.model, &self.info.unique_id)
    }

    /// Fetch the full flat state map.
    ///
    /// Waits for any in-flight call to finish first. No retry happens
    /// here; the caller owns the retry policy.
    pub async fn fetch_state(&self) -> Result<SwitchState, CoreError> {
        let mut guard = Arc::clone(&self.connector).lock_owned().await;
        let state = tokio::task::spawn_blocking(move || guard.fetch_state()).await??;
        Ok(state)
    }
}

/// Blocking session setup, run on the blocking executor.
fn open_session(
    factory: &dyn ConnectorFactory,
    credentials: &Credentials,
) -> Result<(Box<dyn SwitchConnector>, SessionInfo), CoreError> {
    let mut connector = factory.connect(credentials)?;

    if let Err(e) = connector.autodetect_model() {
        warn!(
            host = %credentials.host,
            error = %e,
            "model autodetection failed, continuing with unknown model"
        );
    }

    if !connector.login()? {
        return Err(CoreError::AuthenticationFailed {
            message: format!("switch at {} rejected the credentials", credentials.host),
        });
    }

    // Some firmwares only reveal the model page after login.
    if !connector.model().is_known() {
        if let Err(e) = connector.autodetect_model() {
            debug!(host = %credentials.host, error = %e, "post-login autodetection failed");
        }
    }

    let unique_id = connector.unique_id()?;
    let info = SessionInfo {
        model: connector.model(),
        unique_id,
        port_count: connector.port_count(),
    };
    Ok((connector, info))
}
