//! Engine configuration.
//!
//! Everything is loaded from one JSON document; every field has a default so
//! a partial file (or `{}`) is valid.
//!
//! ```json
//! {
//!   "manager": { "capacity": 1024, "capacity_policy": { "kind": "grow", "max": 8192 } },
//!   "tick": { "fixed_dt": 0.05 },
//!   "templates": [ { "name": "spearman", "speed": 4.0, "tags": ["unit"] } ],
//!   "mods": { "public": { "name": "rts_core", "version": "0.0.25" } },
//!   "enabled_mods": ["public"],
//!   "log_filter": "phalanx=debug"
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use phalanx_entity::manager::ManagerConfig;
use phalanx_entity::slot::{CapacityPolicy, MAX_CAPACITY};
use phalanx_entity::template::EntityTemplate;

use crate::tick::TickConfig;
use crate::WorldError;

/// Default `tracing` directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub manager: ManagerConfig,
    pub tick: TickConfig,
    /// Templates registered in the catalog at world creation.
    pub templates: Vec<EntityTemplate>,
    /// Installed mods, keyed by id (the `mod.json` contents of each).
    pub mods: serde_json::Map<String, serde_json::Value>,
    /// Ids of the mods the user enabled. Checked for compatibility at startup.
    pub enabled_mods: Vec<String>,
    /// `tracing` filter directive used by [`init_tracing`](crate::logging::init_tracing).
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manager: ManagerConfig::default(),
            tick: TickConfig::default(),
            templates: Vec::new(),
            mods: serde_json::Map::new(),
            enabled_mods: Vec::new(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, WorldError> {
        let config: Self = serde_json::from_str(text).map_err(|e| WorldError::Config {
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the tick loop and manager cannot run with.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(self.tick.fixed_dt > 0.0 && self.tick.fixed_dt.is_finite()) {
            return Err(WorldError::Config {
                details: format!(
                    "tick.fixed_dt must be positive and finite, got {}",
                    self.tick.fixed_dt
                ),
            });
        }
        if self.manager.capacity > MAX_CAPACITY {
            return Err(WorldError::Config {
                details: format!(
                    "manager.capacity must be at most {MAX_CAPACITY}, got {}",
                    self.manager.capacity
                ),
            });
        }
        if let CapacityPolicy::Grow { max } = self.manager.capacity_policy {
            if max > MAX_CAPACITY {
                return Err(WorldError::Config {
                    details: format!(
                        "manager.capacity_policy.max must be at most {MAX_CAPACITY}, got {max}"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Read and parse a config file.
pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<EngineConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    EngineConfig::from_json_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
