//! Messages broadcast to entities.

use serde::{Deserialize, Serialize};

use crate::handle::EntityHandle;
use crate::math::Vec3;

/// A message delivered to an entity's `dispatch` entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Head toward `target` at template speed.
    MoveTo { target: Vec3 },
    /// Stop moving.
    Halt,
    /// Lose hit points. An entity reaching zero destroys itself.
    Damage { amount: u32 },
    /// Regain hit points, capped at the template maximum.
    Heal { amount: u32 },
    /// Spawn a new entity of `template` at the receiver's position plus `offset`.
    Spawn { template: String, offset: Vec3 },
    /// Entity `by` tears down `target` (a builder razing a structure, a
    /// garrison releasing a unit). Every other receiver ignores it.
    Demolish {
        by: EntityHandle,
        target: EntityHandle,
    },
    /// Game-specific message the built-in entity does not understand.
    Custom {
        name: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

/// How an entity reacted to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageResponse {
    /// The message changed the entity or queued work.
    Handled,
    /// The entity has no handler for this message.
    Ignored,
}
