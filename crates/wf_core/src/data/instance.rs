//! Nested child worlds (shop interiors, dungeon floors) and their templates.

use serde::{Deserialize, Serialize};

use crate::math::TilePos;

/// A child world reached through a door in a parent anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldInstanceDefinition {
    /// Instance id, referenced by anchor world slots.
    pub id: String,
    /// Template id.
    pub template: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Reusable shape of a child world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTemplate {
    /// Template id.
    pub id: String,
    /// What sort of interior this is.
    pub kind: InstanceKind,
    /// Interior width in tiles.
    pub width: u32,
    /// Interior height in tiles.
    pub height: u32,
    /// Where the player appears when entering.
    pub entry: TilePos,
}

/// Interior kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceKind {
    /// Shop or service interior.
    Shop,
    /// Private house.
    House,
    /// Dungeon floor.
    Dungeon,
    /// Cave.
    Cave,
}

/// An instance declaration joined with its resolved template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundInstance {
    /// The instance declaration.
    pub instance: WorldInstanceDefinition,
    /// Its template.
    pub template: WorldTemplate,
}

impl BoundInstance {
    /// Whether the template's entry tile lies inside its own bounds.
    #[must_use]
    pub fn entry_in_bounds(&self) -> bool {
        let e = self.template.entry;
        e.x >= 0
            && e.y >= 0
            && (e.x as u32) < self.template.width
            && (e.y as u32) < self.template.height
    }
}
