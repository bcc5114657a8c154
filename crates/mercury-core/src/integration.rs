// ── Integration lifecycle ──
//
// Translates host lifecycle calls (setup, unload, options-updated) into
// session, scheduler and entity-table operations for one config entry.

use std::sync::Arc;

use tracing::{debug, info, warn};

use mercury_api::ConnectorFactory;

use crate::catalog::build_catalog;
use crate::config::{ConfigEntry, EntryOptions};
use crate::error::{CoreError, SetupError};
use crate::host::Host;
use crate::model::{DeviceIdentity, DeviceRecord};
use crate::restore::RestoreStore;
use crate::scheduler::{PollScheduler, StateObserver};
use crate::session::DeviceSession;
use crate::store::EntityTable;

/// A loaded config entry: one switch, its poll loop and its entities.
pub struct SwitchIntegration {
    entry: ConfigEntry,
    identity: DeviceIdentity,
    device: DeviceRecord,
    scheduler: PollScheduler,
    entities: Arc<EntityTable>,
    factory: Arc<dyn ConnectorFactory>,
    host: Arc<dyn Host>,
    restore: Arc<dyn RestoreStore>,
}

impl SwitchIntegration {
    /// Load a config entry.
    ///
    /// Returns [`SetupError::NotReady`] when the switch is unreachable or
    /// the first poll fails, so the host can retry later. Rejected
    /// credentials and a missing unique id are terminal.
    pub async fn setup(
        entry: ConfigEntry,
        factory: Arc<dyn ConnectorFactory>,
        host: Arc<dyn Host>,
        restore: Arc<dyn RestoreStore>,
    ) -> Result<Self, SetupError> {
        let unique_id = entry
            .unique_id
            .clone()
            .ok_or_else(|| CoreError::MissingUniqueId {
                entry_id: entry.entry_id.clone(),
            })
            .map_err(SetupError::Failed)?;

        let poll = entry.poll_config();
        let session = DeviceSession::authenticate(
            Arc::clone(&factory),
            entry.data.credentials(),
            poll.fetch_timeout,
        )
        .await
        .map_err(|e| deferred(&entry, SetupError::from(e)))?;

        let identity = DeviceIdentity {
            unique_id,
            display_name: entry.device_name().to_owned(),
            model: session.model().to_string(),
            host: entry.data.host.clone(),
        };
        let device = identity.device_record().map_err(SetupError::Failed)?;
        host.register_device(&device);

        let port_count = session.port_count();
        let scheduler = PollScheduler::new(session, poll);
        let first = scheduler
            .refresh()
            .await
            .map_err(|e| deferred(&entry, SetupError::NotReady(e)))?;

        let first = Some(first.as_ref());
        let entities = Arc::new(EntityTable::materialize(
            build_catalog(port_count, first),
            &identity,
            first,
            restore.as_ref(),
        ));
        host.register_entities(&entry.entry_id, &entities.snapshot());

        scheduler.add_observer(Arc::clone(&entities) as Arc<dyn StateObserver>);
        scheduler.start().await;

        info!(
            entry_id = %entry.entry_id,
            device = %identity.display_name,
            entities = entities.len(),
            "switch set up"
        );

        Ok(Self {
            entry,
            identity,
            device,
            scheduler,
            entities,
            factory,
            host,
            restore,
        })
    }

    /// Unload the entry: stop polling, persist sensor values, and remove
    /// the entities from the host.
    ///
    /// Entities are removed even when persisting fails; the persistence
    /// error is returned afterwards.
    pub async fn unload(self) -> Result<(), CoreError> {
        let Self {
            entry,
            scheduler,
            entities,
            host,
            restore,
            ..
        } = self;
        unload_parts(&entry, &scheduler, &entities, host.as_ref(), restore.as_ref()).await
    }

    /// Apply new options by reloading the entry.
    pub async fn options_updated(self, options: EntryOptions) -> Result<Self, SetupError> {
        let Self {
            mut entry,
            scheduler,
            entities,
            factory,
            host,
            restore,
            ..
        } = self;

        if let Err(e) =
            unload_parts(&entry, &scheduler, &entities, host.as_ref(), restore.as_ref()).await
        {
            warn!(entry_id = %entry.entry_id, error = %e, "unload during reload failed");
        }

        entry.options = options;
        debug!(entry_id = %entry.entry_id, "reloading with updated options");
        Self::setup(entry, factory, host, restore).await
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn entry(&self) -> &ConfigEntry {
        &self.entry
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn device_record(&self) -> &DeviceRecord {
        &self.device
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn entities(&self) -> &Arc<EntityTable> {
        &self.entities
    }
}

async fn unload_parts(
    entry: &ConfigEntry,
    scheduler: &PollScheduler,
    entities: &EntityTable,
    host: &dyn Host,
    restore: &dyn RestoreStore,
) -> Result<(), CoreError> {
    scheduler.stop().await;
    scheduler.clear_observers();

    let persisted = restore.persist(&entities.sensor_values());
    host.remove_entities(&entry.entry_id);
    debug!(entry_id = %entry.entry_id, "switch unloaded");
    persisted
}

fn deferred(entry: &ConfigEntry, err: SetupError) -> SetupError {
    if let SetupError::NotReady(e) = &err {
        warn!(
            entry_id = %entry.entry_id,
            host = %entry.data.host,
            error = %e,
            "switch not ready, setup deferred"
        );
    }
    err
}
