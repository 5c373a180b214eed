//! Entity templates and the template catalog.
//!
//! A template is the shared, read-only data for a class of entities
//! ("infantry_spearman", "cavalry_scout", ...). Every entity built from a
//! template holds an [`Arc`] to it, never a copy.
//!
//! The [`TemplateCatalog`] maps names to templates. The entity manager
//! consults it only when creating entities by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::EntityError;

// ---------------------------------------------------------------------------
// EntityTemplate
// ---------------------------------------------------------------------------

/// Construction parameters shared by every entity of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Unique catalog name.
    pub name: String,
    /// Hit points a fresh entity starts with, and the heal cap.
    #[serde(default = "default_hit_points")]
    pub max_hit_points: u32,
    /// Movement speed in world units per second.
    #[serde(default)]
    pub speed: f32,
    /// Footprint radius, used by selection and render queries.
    #[serde(default = "default_radius")]
    pub radius: f32,
    /// Seconds an entity lives before destroying itself (projectiles,
    /// corpses). `None` lives until destroyed.
    #[serde(default)]
    pub lifetime: Option<f32>,
    /// Free-form classification tags ("unit", "structure", "ranged", ...).
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_hit_points() -> u32 {
    100
}

fn default_radius() -> f32 {
    1.0
}

impl EntityTemplate {
    /// A template with default stats.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_hit_points: default_hit_points(),
            speed: 0.0,
            radius: default_radius(),
            lifetime: None,
            tags: Vec::new(),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.max_hit_points = hit_points;
        self
    }

    pub fn with_lifetime(mut self, seconds: f32) -> Self {
        self.lifetime = Some(seconds);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

// ---------------------------------------------------------------------------
// TemplateCatalog
// ---------------------------------------------------------------------------

/// Name-indexed collection of shared templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, Arc<EntityTemplate>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing (and returning) any previous entry with the
    /// same name. Entities already built from the old entry keep it alive.
    pub fn insert(&mut self, template: EntityTemplate) -> Option<Arc<EntityTemplate>> {
        self.templates.insert(template.name.clone(), Arc::new(template))
    }

    /// Look up a template by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<EntityTemplate>, EntityError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| EntityError::UnknownTemplate {
                name: name.to_owned(),
                known: self.names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// All template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Build a catalog from a list of templates. Duplicate names are rejected.
    pub fn from_templates(
        templates: impl IntoIterator<Item = EntityTemplate>,
    ) -> Result<Self, EntityError> {
        let mut catalog = Self::new();
        for template in templates {
            let name = template.name.clone();
            if catalog.insert(template).is_some() {
                return Err(EntityError::InvalidTemplate {
                    details: format!("duplicate template name '{name}'"),
                });
            }
        }
        Ok(catalog)
    }

    /// Parse a JSON array of templates.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, EntityError> {
        let templates: Vec<EntityTemplate> =
            serde_json::from_value(value.clone()).map_err(|e| EntityError::InvalidTemplate {
                details: e.to_string(),
            })?;
        Self::from_templates(templates)
    }

    /// Parse a JSON array of templates from text.
    pub fn from_json_str(text: &str) -> Result<Self, EntityError> {
        let templates: Vec<EntityTemplate> =
            serde_json::from_str(text).map_err(|e| EntityError::InvalidTemplate {
                details: e.to_string(),
            })?;
        Self::from_templates(templates)
    }
}
