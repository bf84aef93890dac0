//! Reference layouts for buildings.
//!
//! Organism layouts ask an [`ArchetypeSource`] for the reference layout of
//! each building they place. A failed lookup never aborts composition: the
//! building is kept as a placeholder and the miss is recorded on the layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Reference layout for one building type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    /// Archetype id (`service:inn`, `house:cottage`...).
    pub id: String,
    /// Tile-layer names the renderer stamps for this building.
    #[serde(default)]
    pub layers: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Lookup of building archetypes by id.
pub trait ArchetypeSource {
    /// Load an archetype.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::MissingArchetype`] when the id is unknown.
    fn load(&self, id: &str) -> Result<Archetype>;
}

/// In-memory archetype registry.
#[derive(Debug, Clone, Default)]
pub struct ArchetypeRegistry {
    archetypes: BTreeMap<String, Archetype>,
}

impl ArchetypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an archetype.
    pub fn insert(&mut self, archetype: Archetype) {
        self.archetypes.insert(archetype.id.clone(), archetype);
    }

    /// Number of registered archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

impl ArchetypeSource for ArchetypeRegistry {
    fn load(&self, id: &str) -> Result<Archetype> {
        self.archetypes
            .get(id)
            .cloned()
            .ok_or_else(|| GenError::MissingArchetype(id.to_string()))
    }
}

/// Resolve an archetype, degrading a failure to `None`.
///
/// Misses are pushed onto `fallbacks` so that validation can surface them.
pub(crate) fn resolve_or_placeholder(
    source: &dyn ArchetypeSource,
    id: &str,
    fallbacks: &mut Vec<String>,
) -> Option<Archetype> {
    match source.load(id) {
        Ok(archetype) => Some(archetype),
        Err(err) => {
            tracing::debug!(archetype = id, error = %err, "Using placeholder building");
            fallbacks.push(id.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_load() {
        let mut registry = ArchetypeRegistry::new();
        registry.insert(Archetype {
            id: "service:inn".into(),
            layers: vec!["inn_walls".into()],
            tags: Vec::new(),
        });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.load("service:inn").unwrap().layers.len(), 1);
        assert!(matches!(
            registry.load("service:temple"),
            Err(GenError::MissingArchetype(_))
        ));
    }

    #[test]
    fn test_missing_archetype_degrades() {
        let registry = ArchetypeRegistry::new();
        let mut fallbacks = Vec::new();
        assert!(resolve_or_placeholder(&registry, "house:hut", &mut fallbacks).is_none());
        assert_eq!(fallbacks, vec!["house:hut".to_string()]);
    }
}
