//! Biome profiles: ground, road width, scatter rules and edge treatment.
//!
//! A biome profile only carries labels ("grass", "oak_tree"). Resolving those
//! labels to concrete tile ids is the tile-map serializer's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Everything the composers need to know about a biome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeProfile {
    /// Biome id.
    pub id: String,
    /// Ground label for unoccupied tiles.
    pub base_ground: String,
    /// Width of main and branch roads in tiles.
    #[serde(default = "default_road_width")]
    pub road_width: u32,
    /// Border treatment.
    pub edge: EdgeTreatment,
    /// Scatter objects.
    #[serde(default)]
    pub scatter: Vec<ScatterRule>,
}

const fn default_road_width() -> u32 {
    3
}

/// Concentric border rings around a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTreatment {
    /// Edge object label (tree wall, cliff, dunes...).
    pub kind: String,
    /// Number of rings.
    pub depth: u32,
}

/// One kind of decorative object to scatter over open ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterRule {
    /// Object label.
    pub object: String,
    /// Expected objects per 100 tiles of map area.
    pub frequency: f64,
    /// Minimum Manhattan spacing to other scatter objects.
    #[serde(default = "default_exclusion_radius")]
    pub exclusion_radius: u32,
    /// Prefer the outer band of the map.
    #[serde(default)]
    pub edge_bias: bool,
    /// Whether the object blocks movement.
    #[serde(default)]
    pub blocking: bool,
}

const fn default_exclusion_radius() -> u32 {
    2
}

impl ScatterRule {
    fn new(object: &str, frequency: f64, exclusion_radius: u32, blocking: bool) -> Self {
        Self {
            object: object.into(),
            frequency,
            exclusion_radius,
            edge_bias: false,
            blocking,
        }
    }

    fn edge_biased(mut self) -> Self {
        self.edge_bias = true;
        self
    }
}

/// Registry of biome profiles keyed by id.
#[derive(Debug, Clone, Default)]
pub struct BiomeRegistry {
    biomes: BTreeMap<String, BiomeProfile>,
}

impl BiomeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in biomes.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for profile in builtin_biomes() {
            registry.insert(profile);
        }
        registry
    }

    /// Add or replace a profile.
    pub fn insert(&mut self, profile: BiomeProfile) {
        self.biomes.insert(profile.id.clone(), profile);
    }

    /// Look up a profile.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::UnknownBiome`] if no profile has this id.
    pub fn get(&self, id: &str) -> Result<&BiomeProfile> {
        self.biomes
            .get(id)
            .ok_or_else(|| GenError::UnknownBiome(id.to_string()))
    }

    /// Whether a profile with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.biomes.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.biomes.keys().map(String::as_str)
    }
}

fn builtin_biomes() -> Vec<BiomeProfile> {
    vec![
        BiomeProfile {
            id: "forest".into(),
            base_ground: "forest_floor".into(),
            road_width: 3,
            edge: EdgeTreatment {
                kind: "tree_wall".into(),
                depth: 3,
            },
            scatter: vec![
                ScatterRule::new("oak_tree", 4.0, 2, true),
                ScatterRule::new("pine_tree", 2.0, 3, true).edge_biased(),
                ScatterRule::new("fern", 3.0, 2, false),
                ScatterRule::new("mushroom", 0.5, 2, false),
            ],
        },
        BiomeProfile {
            id: "plains".into(),
            base_ground: "grass".into(),
            road_width: 3,
            edge: EdgeTreatment {
                kind: "hedge".into(),
                depth: 2,
            },
            scatter: vec![
                ScatterRule::new("boulder", 0.5, 3, true),
                ScatterRule::new("wildflowers", 3.0, 2, false),
                ScatterRule::new("tall_grass", 4.0, 2, false),
            ],
        },
        BiomeProfile {
            id: "desert".into(),
            base_ground: "sand".into(),
            road_width: 3,
            edge: EdgeTreatment {
                kind: "dune".into(),
                depth: 2,
            },
            scatter: vec![
                ScatterRule::new("cactus", 1.0, 3, true),
                ScatterRule::new("bleached_bones", 0.3, 4, false),
                ScatterRule::new("rock_outcrop", 0.5, 4, true).edge_biased(),
            ],
        },
        BiomeProfile {
            id: "swamp".into(),
            base_ground: "mud".into(),
            road_width: 1,
            edge: EdgeTreatment {
                kind: "reeds".into(),
                depth: 2,
            },
            scatter: vec![
                ScatterRule::new("dead_tree", 2.0, 2, true),
                ScatterRule::new("lily_pad", 2.0, 2, false),
            ],
        },
        BiomeProfile {
            id: "mountain".into(),
            base_ground: "scree".into(),
            road_width: 1,
            edge: EdgeTreatment {
                kind: "cliff".into(),
                depth: 4,
            },
            scatter: vec![
                ScatterRule::new("boulder", 2.0, 2, true).edge_biased(),
                ScatterRule::new("alpine_shrub", 1.5, 2, false),
            ],
        },
    ]
}
