//! Town layout: services and houses on a ring around a central feature.
//!
//! Buildings are spaced by angle first and pushed outwards on collision. The
//! last resort is a fallback ring far outside the normal one; what happens
//! there is reported per building as a [`PlacementOutcome`] rather than
//! silently accepting an overlap.

use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use super::{
    BuildingKind, CentralFeature, DoorTransition, HouseStyle, NpcPlacement, PlacedBuilding,
    PlacementOutcome,
};
use crate::archetype::{resolve_or_placeholder, ArchetypeSource};
use crate::data::TownDefinition;
use crate::math::{polar_to_tile, Rect, Size, TilePos};
use crate::rng::SeededRng;

/// Minimum spacing between two town buildings.
pub const BUILDING_GAP: i32 = 2;
/// Smallest ring radius.
pub const MIN_TOWN_RADIUS: i32 = 14;
/// Tries per building before the fallback ring.
pub const PLACEMENT_ATTEMPTS: u32 = 8;

const ANGLE_JITTER: f64 = 0.15;
const DEFAULT_FEATURE: &str = "fountain";

/// Result of [`layout_town`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownLayout {
    /// Bounding box.
    pub bounds: Rect,
    /// Box center.
    pub center: TilePos,
    /// Ring radius.
    pub ring_radius: i32,
    /// Fountain, well or statue.
    pub central_feature: CentralFeature,
    /// Services then houses, in placement order, including failures.
    pub buildings: Vec<PlacedBuilding>,
    /// Service doors mapped to child worlds.
    pub door_transitions: Vec<DoorTransition>,
    /// Keeper positions.
    pub npc_positions: Vec<NpcPlacement>,
    /// Edge midpoints in N, S, E, W order.
    pub entry_anchors: Vec<TilePos>,
    /// Archetype ids that fell back to placeholders.
    pub archetype_fallbacks: Vec<String>,
}

impl TownLayout {
    /// Buildings that did not get a clean placement.
    pub fn degraded(&self) -> impl Iterator<Item = &PlacedBuilding> {
        self.buildings.iter().filter(|b| b.outcome.is_degraded())
    }
}

/// Ring radius that fits `count` buildings of at most `max_side` tiles.
#[must_use]
pub fn ring_radius(count: usize, max_side: i32) -> i32 {
    if count <= 1 {
        return MIN_TOWN_RADIUS;
    }
    let angular_gap = TAU / count as f64;
    let needed = f64::from(max_side + BUILDING_GAP) / (2.0 * (angular_gap / 2.0).sin());
    (needed.ceil() as i32).max(MIN_TOWN_RADIUS)
}

/// Lay out a town inside `bounds`.
///
/// `instance_ids` are handed to service doors in placement order; services
/// beyond the list get no door.
pub fn layout_town(
    bounds: Rect,
    town: &TownDefinition,
    instance_ids: &[String],
    seed: u64,
    archetypes: &dyn ArchetypeSource,
) -> TownLayout {
    let mut rng = SeededRng::new(seed);
    let center = bounds.center();
    let label = town.central_feature.as_deref().unwrap_or(DEFAULT_FEATURE);
    let central_feature = CentralFeature::at(label, center);

    let mut kinds: Vec<BuildingKind> = town
        .services
        .iter()
        .map(|s| BuildingKind::Service {
            service: s.kind,
            keeper: s.keeper.clone(),
        })
        .collect();
    for _ in 0..town.house_count {
        let style = rng
            .pick(&HouseStyle::TOWN_MIX)
            .copied()
            .unwrap_or(HouseStyle::Cottage);
        kinds.push(BuildingKind::House(style));
    }

    let total = kinds.len();
    let max_side = kinds.iter().map(|k| footprint_of(k).max_side()).max().unwrap_or(0);
    let ring_radius = ring_radius(total, max_side);
    let angular_gap = if total == 0 { 0.0 } else { TAU / total as f64 };

    let mut buildings: Vec<PlacedBuilding> = Vec::with_capacity(total);
    let mut archetype_fallbacks = Vec::new();

    for (i, kind) in kinds.into_iter().enumerate() {
        let size = footprint_of(&kind);
        // Index 0 sits due north.
        let base_angle = i as f64 * angular_gap - FRAC_PI_2;

        let mut placed = None;
        for k in 0..PLACEMENT_ATTEMPTS {
            let angle = if k == 0 {
                base_angle
            } else {
                base_angle + rng.range_f64(-ANGLE_JITTER, ANGLE_JITTER)
            };
            let radius = ring_radius + 2 * k as i32;
            let rect = Rect::centered(polar_to_tile(center, angle, f64::from(radius)), size);
            if fits_box(&bounds, &rect) && !collides(&buildings, &rect) {
                placed = Some((rect, PlacementOutcome::Placed { attempts: k + 1 }));
                break;
            }
        }

        let (footprint, outcome) = placed.unwrap_or_else(|| {
            let radius = ring_radius + 2 * total as i32;
            let rect = Rect::centered(polar_to_tile(center, base_angle, f64::from(radius)), size);
            (rect, fallback_outcome(&bounds, &buildings, &rect))
        });

        if outcome.is_degraded() {
            tracing::warn!(
                building = %kind.archetype_id(),
                ?outcome,
                "Town building fell back to the outer ring"
            );
        }

        let archetype =
            resolve_or_placeholder(archetypes, &kind.archetype_id(), &mut archetype_fallbacks);
        buildings.push(PlacedBuilding {
            kind,
            footprint,
            door: None,
            outcome,
            archetype,
        });
    }

    let (door_transitions, npc_positions) = assign_doors(&mut buildings, instance_ids);

    let entry_anchors = vec![
        TilePos::new(center.x, bounds.y),
        TilePos::new(center.x, bounds.bottom() - 1),
        TilePos::new(bounds.right() - 1, center.y),
        TilePos::new(bounds.x, center.y),
    ];

    tracing::trace!(buildings = total, ring_radius, "Town laid out");

    TownLayout {
        bounds,
        center,
        ring_radius,
        central_feature,
        buildings,
        door_transitions,
        npc_positions,
        entry_anchors,
        archetype_fallbacks,
    }
}

fn footprint_of(kind: &BuildingKind) -> Size {
    match kind {
        BuildingKind::House(style) => style.footprint(),
        BuildingKind::Service { service, .. } => service.footprint(),
        BuildingKind::Structure(_) => Size::new(5, 5),
    }
}

/// Whether a footprint and the door row under it lie inside the box.
fn fits_box(bounds: &Rect, rect: &Rect) -> bool {
    bounds.contains_rect(&Rect::new(rect.x, rect.y, rect.w, rect.h + 1))
}

/// Classify a footprint on the fallback ring.
fn fallback_outcome(bounds: &Rect, placed: &[PlacedBuilding], rect: &Rect) -> PlacementOutcome {
    if !fits_box(bounds, rect) {
        PlacementOutcome::Failed
    } else if collides(placed, rect) {
        PlacementOutcome::PlacedWithOverlap
    } else {
        PlacementOutcome::Placed {
            attempts: PLACEMENT_ATTEMPTS + 1,
        }
    }
}

fn collides(placed: &[PlacedBuilding], rect: &Rect) -> bool {
    placed
        .iter()
        .filter(|b| b.is_stamped())
        .any(|b| b.footprint.inflate(BUILDING_GAP).intersects(rect))
}

/// Give every stamped building its door, mapping service doors to child
/// worlds and standing keepers next to them.
fn assign_doors(
    buildings: &mut [PlacedBuilding],
    instance_ids: &[String],
) -> (Vec<DoorTransition>, Vec<NpcPlacement>) {
    let mut instances = instance_ids.iter();
    let mut transitions = Vec::new();
    let mut npcs = Vec::new();

    for building in buildings.iter_mut().filter(|b| b.is_stamped()) {
        let door = building.footprint.bottom_center();
        match &building.kind {
            BuildingKind::Service { keeper, .. } => {
                let Some(instance) = instances.next() else {
                    continue;
                };
                building.door = Some(door);
                transitions.push(DoorTransition {
                    door,
                    instance: instance.clone(),
                    building: building.kind.archetype_id(),
                });
                if let Some(npc) = keeper {
                    npcs.push(NpcPlacement {
                        npc: npc.clone(),
                        position: door.offset(1, 1),
                    });
                }
            }
            BuildingKind::House(_) | BuildingKind::Structure(_) => building.door = Some(door),
        }
    }

    (transitions, npcs)
}
