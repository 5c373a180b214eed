//! Phalanx Engine -- world ownership, the fixed-timestep tick loop, and
//! engine configuration.
//!
//! The engine crate ties the entity table from `phalanx-entity` and the mod
//! checks from `phalanx-mods` into a runnable simulation:
//!
//! - [`World`](world::World) owns the entity manager and a queue of posted
//!   messages.
//! - [`TickLoop`](tick::TickLoop) advances the world at a fixed time step.
//! - [`EngineConfig`](config::EngineConfig) loads everything from JSON.
//!
//! # Example
//!
//! ```
//! use phalanx_engine::prelude::*;
//!
//! let config = EngineConfig::from_json_str(r#"{
//!     "manager": { "capacity": 32 },
//!     "templates": [ { "name": "spearman", "speed": 2.0 } ]
//! }"#).unwrap();
//!
//! let world = World::from_config(&config).unwrap();
//! let mut tick_loop = TickLoop::new(world, config.tick.clone());
//!
//! let spearman = tick_loop
//!     .world_mut()
//!     .entity_manager_mut()
//!     .unwrap()
//!     .create_named("spearman", Vec3::ZERO, 0.0)
//!     .unwrap();
//! tick_loop.world_mut().post(Message::MoveTo { target: Vec3::new(0.0, 0.0, 50.0) });
//! tick_loop.run_ticks(20).unwrap();
//!
//! let entities = tick_loop.world().entity_manager().unwrap();
//! assert!(entities.get(spearman).unwrap().position.z > 1.9);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod logging;
pub mod tick;
pub mod world;

pub use phalanx_entity;
pub use phalanx_mods;

use phalanx_entity::EntityError;
use phalanx_mods::ModError;

/// Errors produced by the world and the tick loop.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The world has been shut down and no longer owns an entity manager.
    #[error("entity manager is not available")]
    EntityManagerUnavailable,

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Mods(#[from] ModError),

    #[error("invalid engine configuration: {details}")]
    Config { details: String },
}

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{load_config_file, EngineConfig};
    pub use crate::logging::init_tracing;
    pub use crate::tick::{TickConfig, TickDiagnostics, TickLoop};
    pub use crate::world::World;
    pub use crate::WorldError;
    pub use phalanx_entity::prelude::*;
    pub use phalanx_mods::prelude::*;
}
