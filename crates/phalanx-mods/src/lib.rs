//! Phalanx Mods -- mod metadata, version comparison and dependency checking.
//!
//! # Example
//!
//! ```
//! use phalanx_mods::prelude::*;
//!
//! assert!(compare_version_strings("0.0.9", "<", "0.1.0").unwrap());
//!
//! let mut registry = ModRegistry::from_json_value(&serde_json::json!({
//!     "public": { "name": "rts_core", "version": "0.0.25" },
//!     "cavalry": { "name": "cavalry", "version": "1.0", "dependencies": ["rts_core>=0.0.24"] },
//! }))
//! .unwrap();
//!
//! assert!(registry.check_compatibility(&["public", "cavalry"]).is_ok());
//! ```

#![deny(unsafe_code)]

pub mod registry;
pub mod version;

/// Errors produced while parsing or checking mods.
#[derive(Debug, thiserror::Error)]
pub enum ModError {
    #[error("unknown version operator '{op}'")]
    UnknownOperator { op: String },

    #[error("invalid version string '{version}'")]
    InvalidVersion { version: String },

    #[error("invalid dependency declaration '{dependency}'")]
    InvalidDependency { dependency: String },

    #[error("invalid mod info: {details}")]
    InvalidModInfo { details: String },

    /// Enabled mods that are missing or have unmet dependencies.
    #[error("incompatible mods: [{}]", .mods.join(", "))]
    Incompatible { mods: Vec<String> },
}

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::registry::{Dependency, ModInfo, ModRegistry, ENGINE_MOD_ID};
    pub use crate::version::{compare_version_strings, ComparisonOp, Version};
    pub use crate::ModError;
}
