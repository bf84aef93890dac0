//! Organism layouts: self-arranging building clusters.
//!
//! A layout places buildings inside a bounding box and reports doors, entry
//! anchors and internal routes. Layouts never touch the collision grid
//! themselves; the caller stamps the result with [`OrganismLayout::stamp`].

mod hamlet;
mod landmark;
mod town;

pub use hamlet::{layout_hamlet, HamletConfig, HamletLayout, MAX_HAMLET_HOUSES};
pub use landmark::{layout_landmark, LandmarkLayout, LANDMARK_ENTRY_DISTANCE, LANDMARK_SIZE};
pub use town::{layout_town, TownLayout, BUILDING_GAP, MIN_TOWN_RADIUS, PLACEMENT_ATTEMPTS};

use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::data::ServiceType;
use crate::grid::{CollisionGrid, TileState};
use crate::math::{Rect, Size, TilePos};

/// Clearance ring stamped around every footprint.
pub const CLEARANCE_RADIUS: u32 = 1;

/// House styles and their footprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HouseStyle {
    /// 4x4.
    Cottage,
    /// 5x4.
    Farmhouse,
    /// 3x3.
    Hut,
    /// 6x4.
    Longhouse,
}

impl HouseStyle {
    /// Mix used for town houses.
    pub const TOWN_MIX: [Self; 3] = [Self::Cottage, Self::Farmhouse, Self::Longhouse];

    /// Building footprint.
    #[must_use]
    pub const fn footprint(self) -> Size {
        match self {
            Self::Cottage => Size::new(4, 4),
            Self::Farmhouse => Size::new(5, 4),
            Self::Hut => Size::new(3, 3),
            Self::Longhouse => Size::new(6, 4),
        }
    }

    /// Lowercase identifier used for archetype lookups.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cottage => "cottage",
            Self::Farmhouse => "farmhouse",
            Self::Hut => "hut",
            Self::Longhouse => "longhouse",
        }
    }
}

/// What a placed building is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingKind {
    /// A plain house.
    House(HouseStyle),
    /// A service building with optional keeper.
    Service {
        /// Service type.
        service: ServiceType,
        /// Keeper NPC id.
        keeper: Option<String>,
    },
    /// A landmark structure (shrine, dungeon mouth...).
    Structure(String),
}

impl BuildingKind {
    /// Archetype id requested for this building.
    #[must_use]
    pub fn archetype_id(&self) -> String {
        match self {
            Self::House(style) => format!("house:{}", style.key()),
            Self::Service { service, .. } => format!("service:{}", service.key()),
            Self::Structure(label) => format!("structure:{label}"),
        }
    }

    /// Whether this is a service building.
    #[must_use]
    pub const fn is_service(&self) -> bool {
        matches!(self, Self::Service { .. })
    }
}

/// How a building's final position was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOutcome {
    /// Placed without overlap after this many attempts.
    Placed {
        /// Attempts used, starting at 1.
        attempts: u32,
    },
    /// Retries ran out; the fallback position overlaps another building.
    PlacedWithOverlap,
    /// Retries ran out; the fallback position leaves the layout's box. The
    /// building is not stamped and has no door.
    Failed,
}

impl PlacementOutcome {
    /// Whether this placement needs attention in a validation report.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        !matches!(self, Self::Placed { .. })
    }
}

/// A building placed by a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBuilding {
    /// Building kind.
    pub kind: BuildingKind,
    /// Occupied tiles. `footprint.origin()` is the building position.
    pub footprint: Rect,
    /// Door tile, directly below the footprint's bottom edge.
    pub door: Option<TilePos>,
    /// Placement outcome.
    pub outcome: PlacementOutcome,
    /// Reference layout, `None` for placeholders.
    pub archetype: Option<Archetype>,
}

impl PlacedBuilding {
    /// Top-left tile.
    #[must_use]
    pub const fn position(&self) -> TilePos {
        self.footprint.origin()
    }

    /// Whether the building occupies tiles on the grid.
    #[must_use]
    pub const fn is_stamped(&self) -> bool {
        !matches!(self.outcome, PlacementOutcome::Failed)
    }
}

/// Well, fountain or statue at the middle of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentralFeature {
    /// Feature label.
    pub label: String,
    /// Center tile.
    pub center: TilePos,
    /// Occupied tiles.
    pub footprint: Rect,
}

impl CentralFeature {
    /// Side length of central features.
    pub const SIDE: i32 = 3;

    pub(crate) fn at(label: impl Into<String>, center: TilePos) -> Self {
        Self {
            label: label.into(),
            center,
            footprint: Rect::centered(center, Size::new(Self::SIDE, Self::SIDE)),
        }
    }

    /// Walkable gathering tile directly below the feature.
    #[must_use]
    pub const fn hub(&self) -> TilePos {
        TilePos::new(self.center.x, self.footprint.bottom())
    }
}

/// A straight internal path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Start tile.
    pub from: TilePos,
    /// End tile.
    pub to: TilePos,
}

/// A door leading into a child world instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorTransition {
    /// Door tile.
    pub door: TilePos,
    /// Child world instance id.
    pub instance: String,
    /// Archetype id of the building carrying the door.
    pub building: String,
}

/// An NPC standing position chosen by a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcPlacement {
    /// NPC id.
    pub npc: String,
    /// Standing tile.
    pub position: TilePos,
}

/// Any organism layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganismLayout {
    /// Hamlet ring.
    Hamlet(HamletLayout),
    /// Town ring with services.
    Town(TownLayout),
    /// Single fixed footprint.
    Landmark(LandmarkLayout),
}

impl OrganismLayout {
    /// Layout bounding box.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        match self {
            Self::Hamlet(h) => h.bounds,
            Self::Town(t) => t.bounds,
            Self::Landmark(l) => l.bounds,
        }
    }

    /// Every building, including failed placements.
    #[must_use]
    pub fn buildings(&self) -> &[PlacedBuilding] {
        match self {
            Self::Hamlet(h) => &h.houses,
            Self::Town(t) => &t.buildings,
            Self::Landmark(l) => std::slice::from_ref(&l.structure),
        }
    }

    /// Central feature, if any.
    #[must_use]
    pub const fn central_feature(&self) -> Option<&CentralFeature> {
        match self {
            Self::Hamlet(h) => h.well.as_ref(),
            Self::Town(t) => Some(&t.central_feature),
            Self::Landmark(_) => None,
        }
    }

    /// Tiles where region roads may attach.
    #[must_use]
    pub fn entry_anchors(&self) -> Vec<TilePos> {
        match self {
            Self::Hamlet(h) => vec![h.external_anchor],
            Self::Town(t) => t.entry_anchors.clone(),
            Self::Landmark(l) => l.entry_anchors.clone(),
        }
    }

    /// Doors into child worlds.
    #[must_use]
    pub fn door_transitions(&self) -> &[DoorTransition] {
        match self {
            Self::Hamlet(_) => &[],
            Self::Town(t) => &t.door_transitions,
            Self::Landmark(l) => &l.door_transitions,
        }
    }

    /// NPC positions chosen by the layout.
    #[must_use]
    pub fn npc_positions(&self) -> &[NpcPlacement] {
        match self {
            Self::Town(t) => &t.npc_positions,
            Self::Hamlet(_) | Self::Landmark(_) => &[],
        }
    }

    /// Every door tile of a stamped building.
    #[must_use]
    pub fn doors(&self) -> Vec<TilePos> {
        self.buildings()
            .iter()
            .filter(|b| b.is_stamped())
            .filter_map(|b| b.door)
            .collect()
    }

    /// Archetype ids that fell back to placeholders.
    #[must_use]
    pub fn archetype_fallbacks(&self) -> &[String] {
        match self {
            Self::Hamlet(h) => &h.archetype_fallbacks,
            Self::Town(t) => &t.archetype_fallbacks,
            Self::Landmark(l) => &l.archetype_fallbacks,
        }
    }

    /// Point-to-point routes the region router should carve inside the
    /// layout, as `(from, to)` pairs.
    #[must_use]
    pub fn internal_routes(&self) -> Vec<(TilePos, TilePos)> {
        match self {
            Self::Hamlet(h) => {
                let hub = h.hub();
                let mut routes: Vec<_> =
                    h.houses.iter().filter_map(|b| b.door).map(|d| (d, hub)).collect();
                routes.push((hub, h.external_anchor));
                routes
            }
            Self::Town(t) => {
                let hub = t.central_feature.hub();
                let mut routes: Vec<_> = t
                    .buildings
                    .iter()
                    .filter(|b| b.is_stamped() && b.kind.is_service())
                    .filter_map(|b| b.door)
                    .map(|d| (d, hub))
                    .collect();
                routes.extend(t.entry_anchors.iter().map(|&e| (hub, e)));
                routes
            }
            Self::Landmark(_) => Vec::new(),
        }
    }

    /// Mark footprints blocked and their clearance rings reserved.
    pub fn stamp(&self, grid: &mut CollisionGrid) {
        let mut footprints: Vec<Rect> = self
            .buildings()
            .iter()
            .filter(|b| b.is_stamped())
            .map(|b| b.footprint)
            .collect();
        if let Some(feature) = self.central_feature() {
            footprints.push(feature.footprint);
        }

        for r in &footprints {
            grid.mark_area(r.x, r.y, r.w, r.h, TileState::Blocked);
        }
        for r in &footprints {
            grid.mark_clearance(r.x, r.y, r.w, r.h, CLEARANCE_RADIUS);
        }
    }
}
