//! Hamlet layout: a loose ring of houses around an optional well.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::{
    BuildingKind, CentralFeature, HouseStyle, PathSegment, PlacedBuilding, PlacementOutcome,
};
use crate::archetype::{resolve_or_placeholder, ArchetypeSource};
use crate::math::{polar_to_tile, Rect, TilePos};
use crate::rng::SeededRng;

/// Hamlets never hold more houses than this.
pub const MAX_HAMLET_HOUSES: u32 = 8;

const MIN_RING_RADIUS: i32 = 8;
const ANGLE_JITTER: f64 = 0.2;
const EXTERNAL_ANCHOR_OFFSET: i32 = 5;

/// Hamlet parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HamletConfig {
    /// Number of houses, capped at [`MAX_HAMLET_HOUSES`].
    pub house_count: u32,
    /// Put a well at the center.
    pub place_well: bool,
    /// Styles to draw from. Empty means cottages only.
    pub styles: Vec<HouseStyle>,
}

impl Default for HamletConfig {
    fn default() -> Self {
        Self {
            house_count: 3,
            place_well: true,
            styles: vec![HouseStyle::Cottage, HouseStyle::Hut, HouseStyle::Farmhouse],
        }
    }
}

/// Result of [`layout_hamlet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HamletLayout {
    /// Bounding box.
    pub bounds: Rect,
    /// Box center.
    pub center: TilePos,
    /// Ring radius houses are placed on.
    pub ring_radius: i32,
    /// Optional well at the center.
    pub well: Option<CentralFeature>,
    /// Houses in placement order.
    pub houses: Vec<PlacedBuilding>,
    /// One segment per house, door to center.
    pub internal_paths: Vec<PathSegment>,
    /// Where region roads attach, south of the ring.
    pub external_anchor: TilePos,
    /// Archetype ids that fell back to placeholders.
    pub archetype_fallbacks: Vec<String>,
}

impl HamletLayout {
    /// Walkable gathering tile: below the well, or the center itself.
    #[must_use]
    pub fn hub(&self) -> TilePos {
        self.well.as_ref().map_or(self.center, CentralFeature::hub)
    }
}

/// Lay out a hamlet inside `bounds`.
///
/// Houses are not retried on overlap; the ring radius keeps them apart for
/// the house counts a hamlet allows.
pub fn layout_hamlet(
    bounds: Rect,
    config: &HamletConfig,
    seed: u64,
    archetypes: &dyn ArchetypeSource,
) -> HamletLayout {
    let mut rng = SeededRng::new(seed);
    let center = bounds.center();
    let n = config.house_count.min(MAX_HAMLET_HOUSES);

    let max_radius = bounds.w.min(bounds.h) / 2 - 4;
    let ring_radius = max_radius.min(MIN_RING_RADIUS + 2 * n as i32).max(MIN_RING_RADIUS);

    // Leave one row under every house for its door.
    let interior = Rect::new(bounds.x + 1, bounds.y + 1, bounds.w - 2, bounds.h - 3);

    let mut houses = Vec::with_capacity(n as usize);
    let mut internal_paths = Vec::with_capacity(n as usize);
    let mut archetype_fallbacks = Vec::new();

    for i in 0..n {
        let style = rng
            .pick(&config.styles)
            .copied()
            .unwrap_or(HouseStyle::Cottage);
        let angle = f64::from(i) / f64::from(n) * TAU + rng.range_f64(-ANGLE_JITTER, ANGLE_JITTER);
        let radius = ring_radius + rng.range(-1, 2);

        let spot = polar_to_tile(center, angle, f64::from(radius));
        let footprint = Rect::centered(spot, style.footprint()).clamped_into(&interior);
        let door = footprint.bottom_center();

        let kind = BuildingKind::House(style);
        let archetype =
            resolve_or_placeholder(archetypes, &kind.archetype_id(), &mut archetype_fallbacks);

        internal_paths.push(PathSegment { from: door, to: center });
        houses.push(PlacedBuilding {
            kind,
            footprint,
            door: Some(door),
            outcome: PlacementOutcome::Placed { attempts: 1 },
            archetype,
        });
    }

    let well = config.place_well.then(|| CentralFeature::at("well", center));

    let external_anchor = TilePos::new(
        center.x,
        (center.y + ring_radius + EXTERNAL_ANCHOR_OFFSET).min(bounds.bottom() - 1),
    );

    tracing::trace!(houses = n, ring_radius, "Hamlet laid out");

    HamletLayout {
        bounds,
        center,
        ring_radius,
        well,
        houses,
        internal_paths,
        external_anchor,
        archetype_fallbacks,
    }
}
