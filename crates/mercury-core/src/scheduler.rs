// ── Poll scheduler ──
//
// Fetches the flat state map on a fixed period, caches the last good
// map, and fans every successful fetch out to the registered observers.
// A failed or timed-out cycle leaves the cache untouched and notifies
// nobody; only the published `PollStatus` changes.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mercury_api::SwitchState;

use crate::config::PollConfig;
use crate::error::CoreError;
use crate::session::DeviceSession;

// ── Observation ──────────────────────────────────────────────────

/// Receives every successfully fetched flat map.
///
/// Called synchronously from the poll cycle; implementations must not
/// block.
pub trait StateObserver: Send + Sync {
    fn state_updated(&self, state: &SwitchState);
}

/// Where the scheduler is in its cycle.
///
/// A cycle runs `Idle -> Fetching -> {Updated, Failed} -> Idle`. Between
/// cycles the phase is `Idle`; the outcome of the last one stays in
/// [`PollStatus::last_update_success`] and [`PollStatus::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    #[default]
    Idle,
    Fetching,
    Updated,
    Failed,
}

/// Health of the poll loop, for host availability reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollStatus {
    pub phase: PollPhase,
    pub last_update_success: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

// ── PollScheduler ────────────────────────────────────────────────

/// Periodic fetch-and-notify driver for one switch.
///
/// Cheaply cloneable via `Arc<SchedulerInner>`.
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    session: DeviceSession,
    config: PollConfig,
    data: ArcSwapOption<SwitchState>,
    observers: ArcSwap<Vec<Arc<dyn StateObserver>>>,
    status: watch::Sender<PollStatus>,
    published: watch::Sender<Option<Arc<SwitchState>>>,
    /// Held for a whole cycle so two cycles never overlap.
    cycle: Mutex<()>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl PollScheduler {
    pub fn new(session: DeviceSession, config: PollConfig) -> Self {
        let (status, _) = watch::channel(PollStatus::default());
        let (published, _) = watch::channel(None);
        Self {
            inner: Arc::new(SchedulerInner {
                session,
                config,
                data: ArcSwapOption::empty(),
                observers: ArcSwap::from_pointee(Vec::new()),
                status,
                published,
                cycle: Mutex::new(()),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> PollConfig {
        self.inner.config
    }

    pub fn session(&self) -> &DeviceSession {
        &self.inner.session
    }

    /// The last successfully fetched map, if any cycle has succeeded.
    pub fn data(&self) -> Option<Arc<SwitchState>> {
        self.inner.data.load_full()
    }

    pub fn status(&self) -> PollStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PollStatus> {
        self.inner.status.subscribe()
    }

    /// Stream of published maps, starting with the current one.
    pub fn state_stream(&self) -> WatchStream<Option<Arc<SwitchState>>> {
        WatchStream::new(self.inner.published.subscribe())
    }

    pub fn add_observer(&self, observer: Arc<dyn StateObserver>) {
        self.inner.observers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&observer));
            next
        });
    }

    pub fn clear_observers(&self) {
        self.inner.observers.store(Arc::new(Vec::new()));
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.load().len()
    }

    // ── Poll cycle ───────────────────────────────────────────────

    /// Run one poll cycle now.
    ///
    /// Waits for a cycle already in progress. On success the new map is
    /// cached, every observer sees it, and it is returned. On failure the
    /// previous map stays cached and the error is returned.
    pub async fn refresh(&self) -> Result<Arc<SwitchState>, CoreError> {
        let _cycle = self.inner.cycle.lock().await;
        self.inner
            .status
            .send_modify(|s| s.phase = PollPhase::Fetching);

        let timeout = self.inner.config.fetch_timeout;
        let fetched = tokio::time::timeout(timeout, self.inner.session.fetch_state())
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::Timeout {
                    timeout_secs: timeout.as_secs(),
                })
            });

        let outcome = match fetched {
            Ok(state) => {
                let state = Arc::new(state);
                self.inner.data.store(Some(Arc::clone(&state)));

                let observers = self.inner.observers.load();
                for observer in observers.iter() {
                    observer.state_updated(&state);
                }

                self.inner.published.send_replace(Some(Arc::clone(&state)));
                self.inner.status.send_modify(|s| {
                    s.phase = PollPhase::Updated;
                    s.last_update_success = true;
                    s.last_success_at = Some(Utc::now());
                    s.consecutive_failures = 0;
                    s.last_error = None;
                });
                debug!(
                    host = %self.inner.session.host(),
                    keys = state.len(),
                    observers = observers.len(),
                    "poll succeeded"
                );
                Ok(state)
            }
            Err(e) => {
                self.inner.status.send_modify(|s| {
                    s.phase = PollPhase::Failed;
                    s.last_update_success = false;
                    s.consecutive_failures = s.consecutive_failures.saturating_add(1);
                    s.last_error = Some(e.to_string());
                });
                warn!(
                    host = %self.inner.session.host(),
                    error = %e,
                    failures = self.inner.status.borrow().consecutive_failures,
                    "poll failed, keeping last good state"
                );
                Err(e)
            }
        };

        self.inner.status.send_modify(|s| s.phase = PollPhase::Idle);
        outcome
    }

    // ── Background task ──────────────────────────────────────────

    /// Spawn the periodic poll task. No-op when already running.
    pub async fn start(&self) {
        let mut slot = self.inner.task.lock().await;
        if slot.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(refresh_task(self.clone(), cancel.clone()));
        *slot = Some((cancel, handle));
        info!(
            host = %self.inner.session.host(),
            interval_secs = self.inner.config.scan_interval.as_secs(),
            "periodic polling started"
        );
    }

    /// Cancel the periodic task and wait for it to exit.
    pub async fn stop(&self) {
        let running = self.inner.task.lock().await.take();
        if let Some((cancel, handle)) = running {
            cancel.cancel();
            let _ = handle.await;
            debug!(host = %self.inner.session.host(), "periodic polling stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.task.lock().await.is_some()
    }
}

/// Poll every `scan_interval` until cancelled.
async fn refresh_task(scheduler: PollScheduler, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(scheduler.inner.config.scan_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // setup already ran the first cycle

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are recorded in PollStatus and logged by refresh().
                let _ = scheduler.refresh().await;
            }
        }
    }
}
