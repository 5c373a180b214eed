//! Deferred entity-table mutations.
//!
//! Entity handlers run while the manager is walking its slot table, so they
//! cannot create or destroy entities directly. Instead they push requests
//! into an [`EntityCommands`] buffer. The manager applies the buffer right
//! after the handler returns, before moving on to the next slot.
//!
//! Requests are applied in FIFO order. A request that fails (unknown template,
//! full table, stale target) is logged and counted; it never aborts the scan.

use crate::handle::EntityHandle;
use crate::math::Vec3;

/// A single deferred mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRequest {
    /// Create an entity from a catalog template.
    Spawn {
        template: String,
        position: Vec3,
        orientation: f32,
    },
    /// Destroy an entity regardless of its reference count.
    Destroy(EntityHandle),
}

/// FIFO buffer of [`EntityRequest`]s issued by one entity handler.
#[derive(Debug, Default)]
pub struct EntityCommands {
    requests: Vec<EntityRequest>,
}

impl EntityCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue creation of a `template` entity.
    pub fn spawn(&mut self, template: impl Into<String>, position: Vec3, orientation: f32) {
        self.requests.push(EntityRequest::Spawn {
            template: template.into(),
            position,
            orientation,
        });
    }

    /// Queue destruction of `handle`.
    pub fn destroy(&mut self, handle: EntityHandle) {
        self.requests.push(EntityRequest::Destroy(handle));
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// The queued requests, in issue order.
    pub fn requests(&self) -> &[EntityRequest] {
        &self.requests
    }

    /// Take all queued requests, leaving the buffer empty for reuse.
    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, EntityRequest> {
        self.requests.drain(..)
    }
}
