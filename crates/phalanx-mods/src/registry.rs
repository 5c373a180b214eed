//! Mod metadata and compatibility checking.
//!
//! Every mod ships a `mod.json` describing itself. A mod is identified two
//! ways: by its *id* (the directory it was installed into, e.g. `"public"`)
//! and by its *name* (the `"name"` field, e.g. `"0ad"`). The user enables mods
//! by id; dependencies refer to mods by name.
//!
//! A dependency is either a bare name (`"rts_core"`, any version accepted) or
//! a name followed by an operator and a version (`"rts_core>=0.0.24"`).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::version::{ComparisonOp, Version};
use crate::ModError;

/// Enabled-mod id that is always satisfied (the engine's own data).
pub const ENGINE_MOD_ID: &str = "mod";

// ---------------------------------------------------------------------------
// ModInfo
// ---------------------------------------------------------------------------

/// Contents of a mod's `mod.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ModInfo {
    /// Parse a `mod.json` document.
    pub fn from_json_str(text: &str) -> Result<Self, ModError> {
        serde_json::from_str(text).map_err(|e| ModError::InvalidModInfo {
            details: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Dependency
// ---------------------------------------------------------------------------

/// A parsed dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name (not id) of the required mod.
    pub name: String,
    /// Version constraint, if any.
    pub constraint: Option<(ComparisonOp, Version)>,
}

impl Dependency {
    /// Parse `"name"`, `"name=1.0"`, `"name>=0.0.24"`, ...
    pub fn parse(text: &str) -> Result<Self, ModError> {
        let invalid = || ModError::InvalidDependency {
            dependency: text.to_owned(),
        };
        let Some(pos) = text.find(['<', '>', '=']) else {
            if text.is_empty() {
                return Err(invalid());
            }
            return Ok(Self {
                name: text.to_owned(),
                constraint: None,
            });
        };

        let name = &text[..pos];
        let rest = &text[pos..];
        let op_len = if rest[1..].starts_with('=') { 2 } else { 1 };
        let (op, version) = rest.split_at(op_len);
        if name.is_empty() || version.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            name: name.to_owned(),
            constraint: Some((op.parse()?, version.parse()?)),
        })
    }

    /// Whether a mod at `version` satisfies this dependency.
    pub fn accepts(&self, version: &Version) -> bool {
        match &self.constraint {
            None => true,
            Some((op, required)) => op.accepts(version.cmp(required)),
        }
    }
}

// ---------------------------------------------------------------------------
// ModRegistry
// ---------------------------------------------------------------------------

/// All installed mods, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ModRegistry {
    available: BTreeMap<String, ModInfo>,
    incompatible: Vec<String>,
}

impl ModRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an installed mod under `id`.
    pub fn insert(&mut self, id: impl Into<String>, info: ModInfo) {
        self.available.insert(id.into(), info);
    }

    pub fn get(&self, id: &str) -> Option<&ModInfo> {
        self.available.get(id)
    }

    pub fn len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    /// Build a registry from a JSON object mapping id to `mod.json` contents.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, ModError> {
        let available: BTreeMap<String, ModInfo> = serde_json::from_value(value.clone())
            .map_err(|e| ModError::InvalidModInfo {
                details: e.to_string(),
            })?;
        Ok(Self {
            available,
            incompatible: Vec::new(),
        })
    }

    /// Check that every enabled mod exists and has its dependencies met by
    /// the other enabled mods.
    ///
    /// On failure the offending ids are returned in the error and also kept
    /// for [`incompatible_mods`](Self::incompatible_mods).
    pub fn check_compatibility(&mut self, enabled: &[&str]) -> Result<(), ModError> {
        self.incompatible.clear();

        let mut versions: HashMap<&str, Version> = HashMap::new();
        let mut infos: Vec<(&str, &ModInfo)> = Vec::new();
        for &id in enabled {
            if id == ENGINE_MOD_ID {
                continue;
            }
            let Some(info) = self.available.get(id) else {
                debug!(mod_id = id, "enabled mod is not installed");
                self.incompatible.push(id.to_owned());
                continue;
            };
            match info.version.parse::<Version>() {
                Ok(version) => {
                    versions.insert(info.name.as_str(), version);
                }
                Err(e) => {
                    warn!(mod_id = id, error = %e, "mod has an unparsable version");
                }
            }
            infos.push((id, info));
        }

        for (id, info) in infos {
            if !Self::dependencies_met(info, &versions) {
                self.incompatible.push(id.to_owned());
            }
        }

        if self.incompatible.is_empty() {
            Ok(())
        } else {
            Err(ModError::Incompatible {
                mods: self.incompatible.clone(),
            })
        }
    }

    fn dependencies_met(info: &ModInfo, versions: &HashMap<&str, Version>) -> bool {
        info.dependencies.iter().all(|text| {
            let dependency = match Dependency::parse(text) {
                Ok(d) => d,
                Err(e) => {
                    warn!(mod_name = %info.name, error = %e, "bad dependency declaration");
                    return false;
                }
            };
            match versions.get(dependency.name.as_str()) {
                Some(version) => dependency.accepts(version),
                None => {
                    debug!(mod_name = %info.name, dependency = %text, "dependency not enabled");
                    false
                }
            }
        })
    }

    /// Ids that failed the last compatibility check.
    pub fn incompatible_mods(&self) -> &[String] {
        &self.incompatible
    }

    pub fn clear_incompatible(&mut self) {
        self.incompatible.clear();
    }
}
