//! Phalanx Entity -- slot-based entity handles for the Phalanx RTS simulation.
//!
//! Entities live in a fixed-capacity, reference-counted slot table owned by
//! the [`EntityManager`](manager::EntityManager). Callers never hold an entity
//! directly; they hold an [`EntityHandle`](handle::EntityHandle), a copyable
//! `(index, generation)` pair that is re-validated on every access. A handle
//! to a destroyed entity fails closed with [`EntityError::StaleHandle`], even
//! after its slot has been reused.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use phalanx_entity::prelude::*;
//!
//! let mut catalog = TemplateCatalog::new();
//! catalog.insert(EntityTemplate::new("spearman").with_speed(2.0));
//!
//! let mut entities = EntityManager::new(Arc::new(catalog), ManagerConfig::with_capacity(16));
//! let unit = entities
//!     .create_named("spearman", Vec3::ZERO, 0.0)
//!     .unwrap();
//!
//! entities.broadcast(&Message::MoveTo { target: Vec3::new(10.0, 0.0, 0.0) });
//! entities.update_all(1.0);
//!
//! assert_eq!(entities.get(unit).unwrap().position, Vec3::new(2.0, 0.0, 0.0));
//!
//! entities.release(unit).unwrap();
//! assert!(entities.get(unit).is_err());
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod entity;
pub mod handle;
pub mod manager;
pub mod math;
pub mod message;
pub mod slot;
pub mod template;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by entity-table operations.
///
/// All of them are per-operation failures; the table is left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// Every slot is occupied and the table may not grow.
    #[error("entity table full ({capacity} slots)")]
    CapacityExhausted { capacity: usize },

    /// Name-based creation could not find the template.
    #[error("unknown entity template '{name}'. Known templates: [{known}]")]
    UnknownTemplate { name: String, known: String },

    /// The handle's slot was freed or now holds a different entity.
    #[error("entity handle {handle} is stale")]
    StaleHandle { handle: handle::EntityHandle },

    /// Template data could not be parsed.
    #[error("invalid template data: {details}")]
    InvalidTemplate { details: String },

    /// Too many references taken on one entity.
    #[error("reference count overflow on entity {handle}")]
    RefcountOverflow { handle: handle::EntityHandle },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::command::{EntityCommands, EntityRequest};
    pub use crate::entity::{Entity, EntityState, RenderItem, RenderQueue};
    pub use crate::handle::EntityHandle;
    pub use crate::manager::{DispatchReport, EntityManager, ManagerConfig};
    pub use crate::math::Vec3;
    pub use crate::message::{Message, MessageResponse};
    pub use crate::slot::{AllocationStrategy, CapacityPolicy, SlotTable};
    pub use crate::template::{EntityTemplate, TemplateCatalog};
    pub use crate::EntityError;
}
