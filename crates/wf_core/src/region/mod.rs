//! Region composition.
//!
//! A region is built by one pass over a single collision grid, in a fixed
//! phase order: size and exits, anchor layouts, entry nudging, roads, wild
//! features, safe zones, fill. The order is encoded in the types of
//! [`RegionBuild`]; each phase consumes the previous state.
//!
//! ```no_run
//! use wf_core::archetype::ArchetypeRegistry;
//! use wf_core::biome::BiomeRegistry;
//! use wf_core::data::RegionDefinition;
//! use wf_core::region::{compose_region, RegionInputs};
//!
//! # fn demo(definition: &RegionDefinition) -> wf_core::Result<()> {
//! let biomes = BiomeRegistry::with_builtins();
//! let archetypes = ArchetypeRegistry::new();
//! let inputs = RegionInputs {
//!     definition,
//!     biome: biomes.get(&definition.biome)?,
//!     archetypes: &archetypes,
//!     exits: &[],
//!     seed: 42,
//! };
//! let region = compose_region(&inputs);
//! println!("{} paths, {} unrouted", region.paths.len(), region.unrouted.len());
//! # Ok(())
//! # }
//! ```

mod features;
mod pipeline;
mod placement;
mod roads;
mod sizing;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub use features::{
    place_safe_zones, place_wild_features, road_distance_field, SafeZone, WildFeature,
    WildShortfall, SAFE_ZONE_SIDE, TILES_PER_MINUTE, WILD_FEATURE_SPACING,
};
pub use pipeline::{
    AnchorsPlaced, EntriesSettled, Featured, Framed, RegionBuild, Routed, Sheltered,
};
pub use placement::{
    anchor_boxes, anchor_interior, default_npc_position, lay_out_anchor, nudge_entry,
    positioning_order, AnchorBox, PlacedAnchor, ANCHOR_BOX_GAP, MAX_NUDGE_RADIUS, MIN_ANCHOR_BOX,
};
pub use roads::{plan_requests, BRANCH_MAX_DISTANCE, INTERNAL_PATH_WIDTH};
pub use sizing::{
    gate_half_width, gate_tiles, plan_exits, region_side, ExitRequest, RegionExit,
    MAX_REGION_SIDE, MIN_REGION_SIDE,
};

use crate::archetype::ArchetypeSource;
use crate::biome::BiomeProfile;
use crate::data::RegionDefinition;
use crate::error::{GenError, Result};
use crate::fill::FillResult;
use crate::grid::CollisionGrid;
use crate::math::{Rect, TilePos};
use crate::organism::PlacementOutcome;
use crate::rng::fnv1a;
use crate::router::{PathRequest, RoutedPath};

/// Everything a region build needs.
#[derive(Clone, Copy)]
pub struct RegionInputs<'a> {
    /// The declaration.
    pub definition: &'a RegionDefinition,
    /// Resolved biome.
    pub biome: &'a BiomeProfile,
    /// Building archetypes.
    pub archetypes: &'a dyn ArchetypeSource,
    /// Exits requested by the world's connections.
    pub exits: &'a [ExitRequest],
    /// Region seed.
    pub seed: u64,
}

impl std::fmt::Debug for RegionInputs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionInputs")
            .field("region", &self.definition.id)
            .field("biome", &self.biome.id)
            .field("exits", &self.exits.len())
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// Run every phase of a region build.
#[must_use]
pub fn compose_region(inputs: &RegionInputs<'_>) -> ComposedRegion {
    RegionBuild::new(inputs)
        .place_anchors()
        .settle_entries()
        .route()
        .place_wild_features()
        .place_safe_zones()
        .fill()
}

/// A door in the region leading into a child world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDoor {
    /// Anchor owning the door.
    pub anchor: String,
    /// Door tile.
    pub door: TilePos,
    /// Child world instance id.
    pub instance: String,
    /// Archetype id of the building.
    pub building: String,
}

/// Something a build had to compromise on. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degradation {
    /// A town building fell back to its outer ring.
    BuildingPlacement {
        /// Anchor id.
        anchor: String,
        /// Building archetype id.
        building: String,
        /// What happened.
        outcome: PlacementOutcome,
    },
    /// No road-passable tile near an entry anchor.
    EntryNotNudged {
        /// Anchor id.
        anchor: String,
        /// The entry, left where the layout put it.
        entry: TilePos,
    },
    /// An anchor box was moved or shrunk to keep clear of earlier boxes.
    AnchorMoved {
        /// Anchor id.
        anchor: String,
        /// Box the position hint asked for.
        requested: Rect,
        /// Box the anchor got.
        placed: Rect,
    },
    /// No free spot was left, so the box overlaps an earlier one.
    AnchorOverlap {
        /// Anchor id.
        anchor: String,
        /// The overlapping box.
        bounds: Rect,
    },
    /// A building uses a placeholder layout.
    ArchetypeFallback {
        /// Anchor id.
        anchor: String,
        /// Missing archetype id.
        archetype: String,
    },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuildingPlacement {
                anchor,
                building,
                outcome,
            } => write!(f, "{anchor}: {building} placed as {outcome:?}"),
            Self::EntryNotNudged { anchor, entry } => {
                write!(f, "{anchor}: entry {entry} is not road-passable")
            }
            Self::AnchorMoved {
                anchor,
                requested,
                placed,
            } => write!(f, "{anchor}: box moved from {requested:?} to {placed:?}"),
            Self::AnchorOverlap { anchor, bounds } => {
                write!(f, "{anchor}: box {bounds:?} overlaps another anchor")
            }
            Self::ArchetypeFallback { anchor, archetype } => {
                write!(f, "{anchor}: placeholder used for {archetype}")
            }
        }
    }
}

/// A finished region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedRegion {
    /// Region id.
    pub id: String,
    /// Biome id.
    pub biome: String,
    /// Seed the region was built with.
    pub seed: u64,
    /// Final collision grid.
    pub grid: CollisionGrid,
    /// Anchors in declaration order.
    pub anchors: Vec<PlacedAnchor>,
    /// Exits in request order.
    pub exits: Vec<RegionExit>,
    /// Edge tiles kept open for the exits.
    pub gate_tiles: BTreeSet<TilePos>,
    /// Routed paths in routing order.
    pub paths: Vec<RoutedPath>,
    /// Requests the router could not satisfy.
    pub unrouted: Vec<PathRequest>,
    /// Wild features.
    pub wild_features: Vec<WildFeature>,
    /// Wild feature rules that fell short.
    pub wild_shortfalls: Vec<WildShortfall>,
    /// Safe zones.
    pub safe_zones: Vec<SafeZone>,
    /// Fill output.
    pub fill: FillResult,
    /// Doors into child worlds.
    pub door_transitions: Vec<RegionDoor>,
    /// Where every anchor NPC stands.
    pub npc_positions: BTreeMap<String, TilePos>,
    /// Compromises made during the build.
    pub degradations: Vec<Degradation>,
}

impl ComposedRegion {
    /// The whole map as a rectangle.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.grid.bounds()
    }

    /// Look up a placed anchor.
    #[must_use]
    pub fn anchor(&self, id: &str) -> Option<&PlacedAnchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    /// The exit leading to `target`.
    #[must_use]
    pub fn exit_to(&self, target: &str) -> Option<&RegionExit> {
        self.exits.iter().find(|e| e.target == target)
    }

    /// Every (nudged) anchor entry, in anchor order.
    #[must_use]
    pub fn entry_tiles(&self) -> Vec<TilePos> {
        self.anchors.iter().flat_map(|a| a.entries.iter().copied()).collect()
    }

    /// Every door of every stamped building.
    #[must_use]
    pub fn doors(&self) -> Vec<TilePos> {
        self.anchors.iter().flat_map(|a| a.layout.doors()).collect()
    }

    /// Serialize the region with bincode.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GenError::Serialization(format!("Failed to serialize region: {e}")))
    }

    /// Stable hash of the full region, identical across runs and platforms
    /// for the same declaration and seed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn fingerprint(&self) -> Result<u64> {
        self.to_bytes().map(|bytes| fnv1a(&bytes))
    }
}
