//! The [`EntityManager`] owns every live entity and hands out
//! [`EntityHandle`]s to them.
//!
//! # Scans
//!
//! [`broadcast`](EntityManager::broadcast) and
//! [`update_all`](EntityManager::update_all) visit entities in slot-index
//! order. An entity handler may queue creations and destructions on its
//! [`EntityCommands`]; they are applied as soon as that handler returns. To
//! stay well-defined while the table changes underneath it, a scan:
//!
//! 1. snapshots the occupied handles when it starts,
//! 2. skips snapshot entries whose slot was vacated (or recycled) since, and
//! 3. never visits entities created during the same pass.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{EntityCommands, EntityRequest};
use crate::entity::{Entity, RenderQueue};
use crate::handle::EntityHandle;
use crate::math::Vec3;
use crate::message::{Message, MessageResponse};
use crate::slot::{AllocationStrategy, CapacityPolicy, SlotTable};
use crate::template::{EntityTemplate, TemplateCatalog};
use crate::EntityError;

/// Slot count used when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 4096;

// ---------------------------------------------------------------------------
// ManagerConfig
// ---------------------------------------------------------------------------

/// Sizing and allocation behaviour of an [`EntityManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Number of slots. Storage for a slot is allocated on first use.
    pub capacity: usize,
    /// Behaviour when every slot is occupied.
    pub capacity_policy: CapacityPolicy,
    /// Where the free-slot search starts.
    pub allocation: AllocationStrategy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            capacity_policy: CapacityPolicy::Fixed,
            allocation: AllocationStrategy::NextFit,
        }
    }
}

impl ManagerConfig {
    /// A fixed-size next-fit table of `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchReport
// ---------------------------------------------------------------------------

/// Outcome of one scan over the entity table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Entities the message or update was delivered to.
    pub delivered: usize,
    /// Of those, how many answered [`MessageResponse::Ignored`].
    pub ignored: usize,
    /// Snapshot entries skipped because their slot was vacated mid-scan.
    pub skipped: usize,
    /// Entities created by deferred requests during the scan.
    pub spawned: Vec<EntityHandle>,
    /// Entities destroyed by deferred requests during the scan.
    pub destroyed: Vec<EntityHandle>,
    /// Deferred requests that could not be applied.
    pub failed_requests: usize,
}

// ---------------------------------------------------------------------------
// EntityManager
// ---------------------------------------------------------------------------

/// Slot-table owner for all live entities.
#[derive(Debug)]
pub struct EntityManager {
    slots: SlotTable<Entity>,
    catalog: Arc<TemplateCatalog>,
    /// Reused across handler calls during scans.
    commands: EntityCommands,
}

impl EntityManager {
    pub fn new(catalog: Arc<TemplateCatalog>, config: ManagerConfig) -> Self {
        Self {
            slots: SlotTable::new(config.capacity, config.capacity_policy, config.allocation),
            catalog,
            commands: EntityCommands::new(),
        }
    }

    /// A manager with an empty catalog and default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(TemplateCatalog::new()), ManagerConfig::default())
    }

    // -- creation -----------------------------------------------------------

    /// Create an entity from `template` in the next free slot.
    ///
    /// The entity is stamped with its own handle before it becomes visible.
    /// On failure nothing is constructed.
    pub fn create(
        &mut self,
        template: Arc<EntityTemplate>,
        position: Vec3,
        orientation: f32,
    ) -> Result<EntityHandle, EntityError> {
        let handle = self.slots.claim(|me| Entity::new(template, position, orientation, me))?;
        debug!(%handle, "entity created");
        Ok(handle)
    }

    /// Create an entity from the catalog template called `name`.
    pub fn create_named(
        &mut self,
        name: &str,
        position: Vec3,
        orientation: f32,
    ) -> Result<EntityHandle, EntityError> {
        let template = self.catalog.resolve(name)?;
        self.create(template, position, orientation)
    }

    // -- lookup -------------------------------------------------------------

    /// Resolve a handle. Fails with [`EntityError::StaleHandle`] if the slot
    /// has been freed or now holds a different entity.
    pub fn get(&self, handle: EntityHandle) -> Result<&Entity, EntityError> {
        self.slots.get(handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Result<&mut Entity, EntityError> {
        self.slots.get_mut(handle)
    }

    pub fn is_valid(&self, handle: EntityHandle) -> bool {
        self.slots.is_live(handle)
    }

    /// Handles of all entities `predicate` accepts, in slot-index order.
    ///
    /// `predicate` runs exactly once per occupied slot, on every call.
    pub fn find_matching<P>(&self, mut predicate: P) -> Vec<EntityHandle>
    where
        P: FnMut(&Entity) -> bool,
    {
        self.slots
            .iter()
            .filter_map(|(handle, entity)| predicate(entity).then_some(handle))
            .collect()
    }

    /// Handles of every live entity, in slot-index order.
    pub fn all_active(&self) -> Vec<EntityHandle> {
        self.slots.occupied()
    }

    /// Iterate over live entities in slot-index order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.slots.iter()
    }

    // -- reference counting -------------------------------------------------

    pub fn refcount(&self, handle: EntityHandle) -> Result<u32, EntityError> {
        self.slots.refcount(handle)
    }

    /// Take another reference to a live entity. Returns the new count.
    pub fn add_ref(&mut self, handle: EntityHandle) -> Result<u32, EntityError> {
        self.slots.add_ref(handle)
    }

    /// Drop one reference. Returns `true` if that was the last one and the
    /// entity was destroyed.
    pub fn release(&mut self, handle: EntityHandle) -> Result<bool, EntityError> {
        Ok(self.slots.release(handle)?.is_some())
    }

    /// Destroy an entity regardless of outstanding references.
    pub fn destroy(&mut self, handle: EntityHandle) -> Result<(), EntityError> {
        self.slots.remove(handle)?;
        debug!(%handle, "entity destroyed");
        Ok(())
    }

    // -- broadcast ----------------------------------------------------------

    /// Deliver `message` to every entity live at scan start, in slot order.
    pub fn broadcast(&mut self, message: &Message) -> DispatchReport {
        let mut report = DispatchReport::default();
        for handle in self.slots.occupied() {
            let Ok(entity) = self.slots.get_mut(handle) else {
                report.skipped += 1;
                continue;
            };
            if entity.dispatch(message, &mut self.commands) == MessageResponse::Ignored {
                report.ignored += 1;
            }
            report.delivered += 1;
            self.apply_commands(&mut report);
        }
        report
    }

    /// Advance every entity live at scan start by `dt` seconds, in slot order.
    pub fn update_all(&mut self, dt: f32) -> DispatchReport {
        let mut report = DispatchReport::default();
        for handle in self.slots.occupied() {
            let Ok(entity) = self.slots.get_mut(handle) else {
                report.skipped += 1;
                continue;
            };
            entity.update(dt, &mut self.commands);
            report.delivered += 1;
            self.apply_commands(&mut report);
        }
        report
    }

    /// Append a render item for every live entity, in slot order. Returns the
    /// number of items pushed.
    pub fn render_all(&self, queue: &mut RenderQueue) -> usize {
        let mut count = 0;
        for (_, entity) in self.slots.iter() {
            queue.push(entity.render());
            count += 1;
        }
        count
    }

    /// Apply the requests the last handler queued, in FIFO order.
    fn apply_commands(&mut self, report: &mut DispatchReport) {
        if self.commands.is_empty() {
            return;
        }
        let mut commands = std::mem::take(&mut self.commands);
        for request in commands.drain() {
            match request {
                EntityRequest::Spawn {
                    template,
                    position,
                    orientation,
                } => match self.create_named(&template, position, orientation) {
                    Ok(handle) => report.spawned.push(handle),
                    Err(e) => {
                        report.failed_requests += 1;
                        warn!(template = %template, error = %e, "deferred spawn failed");
                    }
                },
                EntityRequest::Destroy(handle) => match self.destroy(handle) {
                    Ok(()) => report.destroyed.push(handle),
                    Err(e) => {
                        report.failed_requests += 1;
                        warn!(%handle, error = %e, "deferred destroy failed");
                    }
                },
            }
        }
        self.commands = commands;
    }

    // -- bookkeeping --------------------------------------------------------

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn catalog(&self) -> &Arc<TemplateCatalog> {
        &self.catalog
    }

    /// Destroy every entity. All outstanding handles become stale.
    pub fn clear(&mut self) -> usize {
        let dropped = self.slots.clear();
        debug!(dropped, "entity table cleared");
        dropped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
