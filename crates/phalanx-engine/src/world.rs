//! The simulation world: owner of the entity manager and the message queue.
//!
//! The world holds at most one [`EntityManager`]. It is created with the
//! world and dropped by [`World::shutdown`]; after that every operation that
//! needs it fails with [`WorldError::EntityManagerUnavailable`] instead of
//! reaching for a missing manager.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use phalanx_entity::entity::EntityState;
use phalanx_entity::manager::{DispatchReport, EntityManager, ManagerConfig};
use phalanx_entity::message::Message;
use phalanx_entity::template::TemplateCatalog;
use phalanx_mods::registry::ModRegistry;

use crate::config::EngineConfig;
use crate::WorldError;

/// Container for all simulation state.
#[derive(Debug)]
pub struct World {
    entities: Option<EntityManager>,
    catalog: Arc<TemplateCatalog>,
    pending: VecDeque<Message>,
}

impl World {
    pub fn new(catalog: TemplateCatalog, config: ManagerConfig) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            entities: Some(EntityManager::new(Arc::clone(&catalog), config)),
            catalog,
            pending: VecDeque::new(),
        }
    }

    /// Build a world from a loaded configuration.
    ///
    /// Registers the configured templates and checks the enabled mods
    /// against the installed ones. Any incompatible mod aborts startup.
    pub fn from_config(config: &EngineConfig) -> Result<Self, WorldError> {
        config.validate()?;

        let mut registry = ModRegistry::from_json_value(&Value::Object(config.mods.clone()))?;
        let enabled: Vec<&str> = config.enabled_mods.iter().map(String::as_str).collect();
        registry.check_compatibility(&enabled)?;

        let catalog = TemplateCatalog::from_templates(config.templates.iter().cloned())?;
        info!(
            templates = catalog.len(),
            mods = enabled.len(),
            capacity = config.manager.capacity,
            "world created"
        );
        Ok(Self::new(catalog, config.manager.clone()))
    }

    pub fn catalog(&self) -> &Arc<TemplateCatalog> {
        &self.catalog
    }

    pub fn has_entity_manager(&self) -> bool {
        self.entities.is_some()
    }

    pub fn entity_manager(&self) -> Result<&EntityManager, WorldError> {
        self.entities
            .as_ref()
            .ok_or(WorldError::EntityManagerUnavailable)
    }

    pub fn entity_manager_mut(&mut self) -> Result<&mut EntityManager, WorldError> {
        self.entities
            .as_mut()
            .ok_or(WorldError::EntityManagerUnavailable)
    }

    // -- messages -----------------------------------------------------------

    /// Queue a message for broadcast at the start of the next tick.
    pub fn post(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    pub fn pending_messages(&self) -> usize {
        self.pending.len()
    }

    /// Broadcast every queued message in posting order and merge the reports.
    ///
    /// The queue is left untouched when the manager is gone.
    pub fn flush_messages(&mut self) -> Result<DispatchReport, WorldError> {
        let entities = self
            .entities
            .as_mut()
            .ok_or(WorldError::EntityManagerUnavailable)?;

        let mut total = DispatchReport::default();
        while let Some(message) = self.pending.pop_front() {
            let report = entities.broadcast(&message);
            total.delivered += report.delivered;
            total.ignored += report.ignored;
            total.skipped += report.skipped;
            total.spawned.extend(report.spawned);
            total.destroyed.extend(report.destroyed);
            total.failed_requests += report.failed_requests;
        }
        Ok(total)
    }

    // -- state --------------------------------------------------------------

    /// Plain-data copy of every live entity, in slot order.
    pub fn capture_states(&self) -> Result<Vec<EntityState>, WorldError> {
        Ok(self
            .entity_manager()?
            .iter()
            .map(|(_, entity)| entity.state())
            .collect())
    }

    /// BLAKE3 hex digest of the entity state.
    ///
    /// Two worlds driven through the same operations hash identically.
    pub fn state_hash(&self) -> Result<String, WorldError> {
        let entities = self.entity_manager()?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(entities.len() as u64).to_le_bytes());
        for (handle, entity) in entities.iter() {
            let state = entity.state();
            hasher.update(&handle.to_raw().to_le_bytes());
            hasher.update(state.template.as_bytes());
            for v in [state.position, state.velocity] {
                hasher.update(&v.x.to_le_bytes());
                hasher.update(&v.y.to_le_bytes());
                hasher.update(&v.z.to_le_bytes());
            }
            hasher.update(&state.orientation.to_le_bytes());
            hasher.update(&state.hit_points.to_le_bytes());
            hasher.update(&state.age.to_le_bytes());
        }
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Destroy every entity and drop the manager. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(mut entities) = self.entities.take() {
            let destroyed = entities.clear();
            let dropped = self.pending.len();
            self.pending.clear();
            info!(destroyed, dropped_messages = dropped, "world shut down");
        } else {
            debug!("shutdown on a world that is already shut down");
        }
    }
}
