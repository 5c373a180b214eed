//! Fixed-timestep tick loop.
//!
//! The [`TickLoop`] drives the simulation forward. Each tick:
//!
//! 1. Messages posted to the [`World`] since the last tick are broadcast, in
//!    posting order.
//! 2. All registered systems run in registration order, each with mutable
//!    access to the world.
//! 3. Every live entity is advanced by `fixed_dt` via
//!    [`EntityManager::update_all`](phalanx_entity::manager::EntityManager::update_all).
//! 4. The tick counter advances.
//!
//! # Example
//!
//! ```
//! use phalanx_engine::prelude::*;
//!
//! let world = World::new(TemplateCatalog::new(), ManagerConfig::with_capacity(64));
//! let config = TickConfig { fixed_dt: 1.0 / 20.0, ..Default::default() };
//! let mut tick_loop = TickLoop::new(world, config);
//!
//! tick_loop.add_system("ai", |_world| {
//!     // decide what to do
//! });
//!
//! tick_loop.run_ticks(10).unwrap();
//! assert_eq!(tick_loop.tick_count(), 10);
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::trace;

use phalanx_entity::manager::DispatchReport;

use crate::world::World;
use crate::WorldError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Headless mode: no render pass is expected between ticks.
    pub headless: bool,
}

impl Default for TickConfig {
    /// Defaults to 20 Hz, the usual RTS simulation rate, headless off.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 20.0,
            headless: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing and dispatch results for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system (in order of execution).
    pub system_times: Vec<(String, Duration)>,
    /// Time spent in the entity update scan.
    pub update_time: Duration,
    /// Total time for the tick.
    pub total_time: Duration,
    /// Outcome of broadcasting this tick's posted messages.
    pub messages: DispatchReport,
    /// Outcome of the entity update scan.
    pub update: DispatchReport,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// A system function run once per tick.
pub type SystemFn = fn(&mut World);

#[derive(Debug)]
struct RegisteredSystem {
    name: String,
    func: SystemFn,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The fixed-timestep simulation driver. Owns the [`World`].
pub struct TickLoop {
    world: World,
    systems: Vec<RegisteredSystem>,
    tick_counter: u64,
    fixed_dt: f64,
    config: TickConfig,
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a new tick loop with the given world and configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(world: World, config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            world,
            systems: Vec::new(),
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            config,
            last_diagnostics: TickDiagnostics::default(),
        }
    }

    /// Register a system to run each tick, after all previously registered
    /// systems.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
        });
    }

    /// Execute one simulation tick.
    ///
    /// Fails with [`WorldError::EntityManagerUnavailable`] once the world has
    /// been shut down; the tick counter does not advance in that case.
    pub fn tick(&mut self) -> Result<&TickDiagnostics, WorldError> {
        if !self.world.has_entity_manager() {
            return Err(WorldError::EntityManagerUnavailable);
        }
        let tick_start = Instant::now();

        // Phase 1: posted messages.
        let messages = self.world.flush_messages()?;

        // Phase 2: systems in registration order.
        let mut system_times = Vec::with_capacity(self.systems.len());
        for system in &self.systems {
            let start = Instant::now();
            (system.func)(&mut self.world);
            system_times.push((system.name.clone(), start.elapsed()));
        }

        // Phase 3: entity simulation.
        let update_start = Instant::now();
        let update = self
            .world
            .entity_manager_mut()?
            .update_all(self.fixed_dt as f32);
        let update_time = update_start.elapsed();

        // Phase 4: advance.
        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            update_time,
            total_time: tick_start.elapsed(),
            messages,
            update,
        };
        trace!(tick = self.tick_counter, "tick complete");
        Ok(&self.last_diagnostics)
    }

    /// Run `count` ticks, stopping at the first failure.
    pub fn run_ticks(&mut self, count: u64) -> Result<(), WorldError> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid floating-point drift from
    /// repeated addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Give the world back, e.g. to shut it down.
    pub fn into_world(self) -> World {
        self.world
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    pub fn is_headless(&self) -> bool {
        self.config.headless
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
