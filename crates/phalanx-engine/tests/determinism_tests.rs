//! Skirmish determinism: 1000 units, 4 systems, 400 ticks.
//!
//! Two identical runs must produce the same BLAKE3 state hash, and the
//! entity table must stay consistent while units die, respawn and fire
//! short-lived projectiles.

use phalanx_engine::prelude::*;

const UNITS: usize = 1000;
const TICKS: u64 = 400;

fn catalog_json() -> &'static str {
    r#"{
        "manager": { "capacity": 1024, "capacity_policy": { "kind": "grow", "max": 8192 } },
        "tick": { "fixed_dt": 0.05 },
        "templates": [
            { "name": "spearman", "speed": 3.0, "max_hit_points": 120, "tags": ["unit", "melee"] },
            { "name": "archer", "speed": 2.5, "max_hit_points": 60, "tags": ["unit", "ranged"] },
            { "name": "arrow", "speed": 0.0, "radius": 0.1, "lifetime": 0.5, "tags": ["projectile"] }
        ]
    }"#
}

// -- Systems ----------------------------------------------------------------

/// Every 25 ticks, each archer fires an arrow from just above its head.
fn volley_system(world: &mut World) {
    let Ok(entities) = world.entity_manager_mut() else {
        return;
    };
    let archers = entities.find_matching(|e| e.template().has_tag("ranged"));
    // Archers never die, so the first one's age counts ticks.
    let Some(clock) = archers.first().and_then(|&h| entities.get(h).ok()) else {
        return;
    };
    if ((clock.age / 0.05).round() as u64) % 25 != 0 {
        return;
    }
    let origins: Vec<_> = archers
        .iter()
        .filter_map(|&h| entities.get(h).ok())
        .map(|archer| archer.position + Vec3::new(0.0, 1.0, 0.0))
        .collect();
    for origin in origins {
        entities.create_named("arrow", origin, 0.0).unwrap();
    }
}

/// Melee units take attrition damage every tick.
fn attrition_system(world: &mut World) {
    let Ok(entities) = world.entity_manager_mut() else {
        return;
    };
    for handle in entities.find_matching(|e| e.template().has_tag("melee")) {
        if let Ok(unit) = entities.get_mut(handle) {
            unit.hit_points = unit.hit_points.saturating_sub(1);
        }
    }
}

/// Remove dead units.
fn reaper_system(world: &mut World) {
    let Ok(entities) = world.entity_manager_mut() else {
        return;
    };
    let dead = entities.find_matching(|e| e.hit_points == 0 && e.template().has_tag("unit"));
    for handle in dead {
        let _ = entities.destroy(handle);
    }
}

/// Keep the spearman count topped up.
fn reinforcement_system(world: &mut World) {
    let Ok(entities) = world.entity_manager_mut() else {
        return;
    };
    let alive = entities
        .find_matching(|e| e.template().has_tag("melee"))
        .len();
    for i in alive..UNITS / 2 {
        let _ = entities.create_named("spearman", Vec3::new(i as f32, 0.0, -10.0), 0.0);
    }
}

// -- Harness ----------------------------------------------------------------

fn run_skirmish() -> (String, TickLoop) {
    let config = EngineConfig::from_json_str(catalog_json()).unwrap();
    let mut world = World::from_config(&config).unwrap();

    {
        let entities = world.entity_manager_mut().unwrap();
        for i in 0..UNITS {
            let (name, x) = if i % 2 == 0 {
                ("spearman", i as f32)
            } else {
                ("archer", -(i as f32))
            };
            let handle = entities
                .create_named(name, Vec3::new(x, 0.0, 0.0), 0.0)
                .unwrap();
            // Stagger initial health so deaths spread over the run.
            entities.get_mut(handle).unwrap().hit_points = 20 + (i as u32 * 7) % 200;
        }
    }
    world.post(Message::MoveTo {
        target: Vec3::new(0.0, 0.0, 100.0),
    });

    let mut tick_loop = TickLoop::new(world, config.tick.clone());
    tick_loop.add_system("volley", volley_system);
    tick_loop.add_system("attrition", attrition_system);
    tick_loop.add_system("reaper", reaper_system);
    tick_loop.add_system("reinforcement", reinforcement_system);
    tick_loop.run_ticks(TICKS).unwrap();

    let hash = tick_loop.world().state_hash().unwrap();
    (hash, tick_loop)
}

// -- Tests ------------------------------------------------------------------

#[test]
fn skirmish_is_deterministic() {
    let (hash_a, loop_a) = run_skirmish();
    let (hash_b, loop_b) = run_skirmish();

    assert_eq!(hash_a.len(), 64);
    assert_eq!(hash_a, hash_b, "identical runs must hash identically");
    assert_eq!(loop_a.tick_count(), TICKS);
    assert_eq!(loop_b.tick_count(), TICKS);
}

#[test]
fn skirmish_keeps_table_consistent() {
    let (_, tick_loop) = run_skirmish();
    let entities = tick_loop.world().entity_manager().unwrap();

    let active = entities.all_active();
    assert_eq!(active.len(), entities.len());
    for &handle in &active {
        assert!(entities.is_valid(handle));
        assert_eq!(entities.get(handle).unwrap().handle(), handle);
        assert_eq!(entities.refcount(handle).unwrap(), 1);
    }

    // Reinforcements keep the melee line full.
    let melee = entities.find_matching(|e| e.template().has_tag("melee"));
    assert_eq!(melee.len(), UNITS / 2);

    // Arrows expire after half a second, so none is older than that.
    for handle in entities.find_matching(|e| e.template().has_tag("projectile")) {
        assert!(entities.get(handle).unwrap().age <= 0.5 + 1e-4);
    }
}

#[test]
fn render_pass_covers_every_live_entity() {
    let (_, tick_loop) = run_skirmish();
    let entities = tick_loop.world().entity_manager().unwrap();

    let mut queue = RenderQueue::new();
    let drawn = entities.render_all(&mut queue);
    assert_eq!(drawn, entities.len());
    let handles: Vec<_> = queue.items().iter().map(|item| item.handle).collect();
    assert_eq!(handles, entities.all_active());
}
