//! Simulated game entities.
//!
//! An [`Entity`] is exclusively owned by its slot in the
//! [`EntityManager`](crate::manager::EntityManager). It keeps a shared
//! reference to its template and a copy of its own handle, which is set once
//! at construction and never changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::EntityCommands;
use crate::handle::EntityHandle;
use crate::math::Vec3;
use crate::message::{Message, MessageResponse};
use crate::template::EntityTemplate;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One live game object.
#[derive(Debug, Clone)]
pub struct Entity {
    template: Arc<EntityTemplate>,
    handle: EntityHandle,
    pub position: Vec3,
    /// Heading in radians around the up axis; 0 faces +z.
    pub orientation: f32,
    pub velocity: Vec3,
    pub hit_points: u32,
    /// Seconds simulated since creation.
    pub age: f32,
}

impl Entity {
    /// Build an entity from its template. `handle` must be the handle of the
    /// slot the entity is being placed in.
    pub fn new(
        template: Arc<EntityTemplate>,
        position: Vec3,
        orientation: f32,
        handle: EntityHandle,
    ) -> Self {
        let hit_points = template.max_hit_points;
        Self {
            template,
            handle,
            position,
            orientation,
            velocity: Vec3::ZERO,
            hit_points,
            age: 0.0,
        }
    }

    /// The handle of the slot holding this entity.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn template(&self) -> &Arc<EntityTemplate> {
        &self.template
    }

    /// Shorthand for `self.template().name`.
    pub fn template_name(&self) -> &str {
        &self.template.name
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec3::ZERO
    }

    /// React to a message. Creation and destruction are queued on `cmds`.
    pub fn dispatch(&mut self, message: &Message, cmds: &mut EntityCommands) -> MessageResponse {
        match message {
            Message::MoveTo { target } => {
                let direction = (*target - self.position).normalize_or_zero();
                self.velocity = direction * self.template.speed;
                if direction != Vec3::ZERO {
                    self.orientation = direction.x.atan2(direction.z);
                }
            }
            Message::Halt => self.velocity = Vec3::ZERO,
            Message::Damage { amount } => {
                let before = self.hit_points;
                self.hit_points = self.hit_points.saturating_sub(*amount);
                if before > 0 && self.hit_points == 0 {
                    cmds.destroy(self.handle);
                }
            }
            Message::Heal { amount } => {
                self.hit_points = self
                    .hit_points
                    .saturating_add(*amount)
                    .min(self.template.max_hit_points);
            }
            Message::Spawn { template, offset } => {
                cmds.spawn(template.clone(), self.position + *offset, self.orientation);
            }
            Message::Demolish { by, target } => {
                if *by != self.handle {
                    return MessageResponse::Ignored;
                }
                cmds.destroy(*target);
            }
            Message::Custom { .. } => return MessageResponse::Ignored,
        }
        MessageResponse::Handled
    }

    /// Advance the simulation by `dt` seconds: linear motion plus ageing.
    /// An entity whose template lifetime runs out queues its own destruction.
    pub fn update(&mut self, dt: f32, cmds: &mut EntityCommands) {
        self.position += self.velocity * dt;
        let before = self.age;
        self.age += dt;
        if let Some(lifetime) = self.template.lifetime {
            if before < lifetime && self.age >= lifetime {
                cmds.destroy(self.handle);
            }
        }
    }

    /// Produce this entity's render item.
    pub fn render(&self) -> RenderItem {
        RenderItem {
            handle: self.handle,
            template: self.template.name.clone(),
            position: self.position,
            orientation: self.orientation,
            radius: self.template.radius,
        }
    }

    /// Serializable view of the mutable state, used for hashing and debugging.
    pub fn state(&self) -> EntityState {
        EntityState {
            handle: self.handle,
            template: self.template.name.clone(),
            position: self.position,
            orientation: self.orientation,
            velocity: self.velocity,
            hit_points: self.hit_points,
            age: self.age,
        }
    }
}

/// Plain-data copy of an entity's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub handle: EntityHandle,
    pub template: String,
    pub position: Vec3,
    pub orientation: f32,
    pub velocity: Vec3,
    pub hit_points: u32,
    pub age: f32,
}

// ---------------------------------------------------------------------------
// Headless render output
// ---------------------------------------------------------------------------

/// What a renderer needs to draw one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderItem {
    pub handle: EntityHandle,
    pub template: String,
    pub position: Vec3,
    pub orientation: f32,
    pub radius: f32,
}

/// Render items collected during one render pass, in slot order.
#[derive(Debug, Default)]
pub struct RenderQueue {
    items: Vec<RenderItem>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: RenderItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::EntityRequest;

    fn scout() -> Entity {
        let template = Arc::new(EntityTemplate::new("scout").with_speed(2.0).with_hit_points(50));
        Entity::new(template, Vec3::ZERO, 0.0, EntityHandle::new(5, 1))
    }

    #[test]
    fn new_entity_takes_template_stats() {
        let e = scout();
        assert_eq!(e.hit_points, 50);
        assert_eq!(e.handle(), EntityHandle::new(5, 1));
        assert_eq!(e.template_name(), "scout");
        assert!(!e.is_moving());
    }

    #[test]
    fn move_to_sets_velocity_and_heading() {
        let mut e = scout();
        let mut cmds = EntityCommands::new();
        let r = e.dispatch(
            &Message::MoveTo {
                target: Vec3::new(10.0, 0.0, 0.0),
            },
            &mut cmds,
        );
        assert_eq!(r, MessageResponse::Handled);
        assert!(e.velocity.approx_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert!((e.orientation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        e.update(1.5, &mut cmds);
        assert!(e.position.approx_eq(Vec3::new(3.0, 0.0, 0.0), 1e-6));

        e.dispatch(&Message::Halt, &mut cmds);
        assert!(!e.is_moving());
        assert!(cmds.is_empty());
    }

    #[test]
    fn lethal_damage_queues_self_destroy_once() {
        let mut e = scout();
        let mut cmds = EntityCommands::new();
        e.dispatch(&Message::Damage { amount: 30 }, &mut cmds);
        assert_eq!(e.hit_points, 20);
        assert!(cmds.is_empty());

        e.dispatch(&Message::Damage { amount: 500 }, &mut cmds);
        assert_eq!(e.hit_points, 0);
        assert_eq!(cmds.requests(), &[EntityRequest::Destroy(e.handle())]);

        e.dispatch(&Message::Damage { amount: 1 }, &mut cmds);
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn heal_is_capped() {
        let mut e = scout();
        let mut cmds = EntityCommands::new();
        e.dispatch(&Message::Damage { amount: 10 }, &mut cmds);
        e.dispatch(&Message::Heal { amount: 1000 }, &mut cmds);
        assert_eq!(e.hit_points, 50);
    }

    #[test]
    fn spawn_is_relative_to_position() {
        let mut e = scout();
        e.position = Vec3::new(1.0, 0.0, 1.0);
        let mut cmds = EntityCommands::new();
        e.dispatch(
            &Message::Spawn {
                template: "arrow".into(),
                offset: Vec3::new(0.0, 1.0, 0.0),
            },
            &mut cmds,
        );
        assert_eq!(
            cmds.requests(),
            &[EntityRequest::Spawn {
                template: "arrow".into(),
                position: Vec3::new(1.0, 1.0, 1.0),
                orientation: 0.0,
            }]
        );
    }

    #[test]
    fn expired_lifetime_queues_self_destroy_once() {
        let template = Arc::new(EntityTemplate::new("arrow").with_lifetime(1.0));
        let mut e = Entity::new(template, Vec3::ZERO, 0.0, EntityHandle::new(0, 0));
        let mut cmds = EntityCommands::new();
        e.update(0.6, &mut cmds);
        assert!(cmds.is_empty());
        e.update(0.6, &mut cmds);
        assert_eq!(cmds.requests(), &[EntityRequest::Destroy(e.handle())]);
        e.update(0.6, &mut cmds);
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn demolish_is_acted_on_by_the_named_entity_only() {
        let mut e = scout();
        let other = EntityHandle::new(7, 0);
        let target = EntityHandle::new(9, 3);
        let mut cmds = EntityCommands::new();

        let r = e.dispatch(&Message::Demolish { by: other, target }, &mut cmds);
        assert_eq!(r, MessageResponse::Ignored);
        assert!(cmds.is_empty());

        let r = e.dispatch(&Message::Demolish { by: e.handle(), target }, &mut cmds);
        assert_eq!(r, MessageResponse::Handled);
        assert_eq!(cmds.requests(), &[EntityRequest::Destroy(target)]);
    }

    #[test]
    fn custom_messages_are_ignored() {
        let mut e = scout();
        let mut cmds = EntityCommands::new();
        let r = e.dispatch(
            &Message::Custom {
                name: "garrison".into(),
                payload: serde_json::Value::Null,
            },
            &mut cmds,
        );
        assert_eq!(r, MessageResponse::Ignored);
    }

    #[test]
    fn render_reports_template_and_pose() {
        let mut e = scout();
        e.position = Vec3::new(4.0, 0.0, 2.0);
        let item = e.render();
        assert_eq!(item.template, "scout");
        assert_eq!(item.position, e.position);
        assert_eq!(item.handle, e.handle());
    }
}
