//! Region declarations and connective-tissue rules.

use serde::{Deserialize, Serialize};

use super::anchor::AnchorDefinition;

/// One explorable region of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    /// Region id, unique within the world.
    pub id: String,
    /// Biome id, resolved against the biome registry.
    pub biome: String,
    /// Intended play time in minutes. Drives the map size.
    pub time_budget_minutes: u32,
    /// Difficulty tier.
    #[serde(default)]
    pub difficulty: u8,
    /// Anchors in declaration order.
    #[serde(default)]
    pub anchors: Vec<AnchorDefinition>,
    /// Rules for the space between anchors.
    #[serde(default)]
    pub tissue: ConnectiveTissue,
}

impl RegionDefinition {
    /// Look up an anchor by id.
    #[must_use]
    pub fn anchor(&self, id: &str) -> Option<&AnchorDefinition> {
        self.anchors.iter().find(|a| a.id == id)
    }
}

/// Rules for roads, rest stops and wild features between anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectiveTissue {
    /// Road density in `[0, 1]`. Zero disables branch shortcuts.
    #[serde(default = "default_path_density")]
    pub path_density: f64,
    /// Minutes of walking between safe zones along main roads.
    #[serde(default)]
    pub safe_zone_interval_minutes: Option<u32>,
    /// Wild features to scatter.
    #[serde(default)]
    pub wild_features: Vec<WildFeatureRule>,
}

const fn default_path_density() -> f64 {
    0.5
}

impl Default for ConnectiveTissue {
    fn default() -> Self {
        Self {
            path_density: default_path_density(),
            safe_zone_interval_minutes: None,
            wild_features: Vec::new(),
        }
    }
}

/// A wild feature type and how many to place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildFeatureRule {
    /// Feature label (e.g. "hidden_chest", "standing_stone").
    pub kind: String,
    /// Placement constraint relative to roads and map edges.
    pub placement: WildPlacement,
    /// Requested count.
    pub count: u32,
}

/// Placement constraint for a wild feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildPlacement {
    /// Within sight of a road.
    NearPath,
    /// Well away from roads.
    OffPath,
    /// Tucked into corners and edges.
    Hidden,
}
