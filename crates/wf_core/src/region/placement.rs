//! Anchor boxes, organism dispatch, entry nudging and NPC defaults.

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeSource;
use crate::data::{AnchorDefinition, AnchorKind, AnchorTag, TownSize};
use crate::grid::CollisionGrid;
use crate::math::{Rect, Size, TilePos};
use crate::organism::{
    layout_hamlet, layout_landmark, layout_town, HamletConfig, OrganismLayout,
};
use crate::rng::SeededRng;

/// How far the entry nudge searches for a road-passable tile.
pub const MAX_NUDGE_RADIUS: i32 = 20;
/// Spread of default NPC positions around an anchor center.
const NPC_SPREAD: i32 = 3;
/// Extra margin between anchor boxes and the edge band.
const INTERIOR_MARGIN: i32 = 2;
/// Tiles kept clear between two anchor boxes.
pub const ANCHOR_BOX_GAP: i32 = 4;
/// Boxes are never shrunk below this side.
pub const MIN_ANCHOR_BOX: i32 = 15;

/// An anchor after layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedAnchor {
    /// Anchor id.
    pub id: String,
    /// Anchor kind.
    pub tag: AnchorTag,
    /// Box reserved for the anchor.
    pub bounds: Rect,
    /// Organism layout inside the box.
    pub layout: OrganismLayout,
    /// Road attachment tiles after nudging.
    pub entries: Vec<TilePos>,
}

/// Part of the map anchor boxes must stay inside.
#[must_use]
pub fn anchor_interior(side: u32, edge_depth: u32) -> Rect {
    let margin = edge_depth as i32 + INTERIOR_MARGIN;
    let side = side as i32;
    Rect::new(margin, margin, (side - 2 * margin).max(1), (side - 2 * margin).max(1))
}

/// Order in which anchors are positioned: explicit coordinates first in
/// declaration order, then hinted anchors stably sorted by hint.
#[must_use]
pub fn positioning_order(anchors: &[AnchorDefinition]) -> Vec<usize> {
    let mut explicit: Vec<usize> = Vec::new();
    let mut hinted: Vec<usize> = Vec::new();
    for (i, anchor) in anchors.iter().enumerate() {
        if anchor.position.explicit().is_some() {
            explicit.push(i);
        } else {
            hinted.push(i);
        }
    }
    hinted.sort_by_key(|&i| anchors[i].position.priority());
    explicit.extend(hinted);
    explicit
}

/// Where an anchor's box ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnchorBox {
    /// Box the position hint asked for.
    pub requested: Rect,
    /// Box the anchor got.
    pub bounds: Rect,
    /// No disjoint spot was found, even at [`MIN_ANCHOR_BOX`].
    pub overlapping: bool,
}

impl AnchorBox {
    /// Whether the box was moved, shrunk or left overlapping.
    #[must_use]
    pub fn is_adjusted(&self) -> bool {
        self.overlapping || self.bounds != self.requested
    }
}

/// Compute a box for every anchor, indexed like `anchors`.
///
/// Hinted anchors are packed into a grid of `ceil(sqrt(n))` columns. Each is
/// centred in its cell with a jitter of up to a sixth of a cell, narrowed so
/// the largest box plus [`ANCHOR_BOX_GAP`] still fits. Boxes are then made
/// disjoint in positioning order: a box that touches an earlier one moves to
/// the nearest free spot, shrinking towards [`MIN_ANCHOR_BOX`] when no spot
/// fits.
pub fn anchor_boxes(
    anchors: &[AnchorDefinition],
    interior: Rect,
    rng: &mut SeededRng,
) -> Vec<AnchorBox> {
    let mut requested = vec![Rect::default(); anchors.len()];
    let order = positioning_order(anchors);

    let hinted: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&i| anchors[i].position.explicit().is_none())
        .collect();
    let n = hinted.len() as i32;
    let cols = (f64::from(n).sqrt().ceil() as i32).max(1);
    let rows = ((n + cols - 1) / cols).max(1);
    let cell_w = interior.w / cols;
    let cell_h = interior.h / rows;

    let largest = hinted
        .iter()
        .map(|&i| anchors[i].kind.box_side())
        .max()
        .unwrap_or(0);
    let spread_x = (cell_w / 6).min(((cell_w - largest - ANCHOR_BOX_GAP) / 2).max(0));
    let spread_y = (cell_h / 6).min(((cell_h - largest - ANCHOR_BOX_GAP) / 2).max(0));

    for &i in &order {
        let side = anchors[i].kind.box_side();
        let size = Size::new(side, side);
        if let Some(center) = anchors[i].position.explicit() {
            requested[i] = Rect::centered(center, size).clamped_into(&interior);
        }
    }

    for (k, &i) in hinted.iter().enumerate() {
        let k = k as i32;
        let (col, row) = (k % cols, k / cols);
        let jx = rng.range(-spread_x, spread_x + 1);
        let jy = rng.range(-spread_y, spread_y + 1);
        let center = TilePos::new(
            interior.x + col * cell_w + cell_w / 2 + jx,
            interior.y + row * cell_h + cell_h / 2 + jy,
        );
        let side = anchors[i].kind.box_side();
        requested[i] = Rect::centered(center, Size::new(side, side)).clamped_into(&interior);
    }

    let mut boxes: Vec<AnchorBox> = requested
        .iter()
        .map(|&r| AnchorBox {
            requested: r,
            bounds: r,
            overlapping: false,
        })
        .collect();
    let mut taken: Vec<Rect> = Vec::with_capacity(anchors.len());
    for &i in &order {
        match disjoint_box(boxes[i].requested, &taken, &interior) {
            Some(bounds) => boxes[i].bounds = bounds,
            None => boxes[i].overlapping = true,
        }
        taken.push(boxes[i].bounds);
    }

    boxes
}

/// The box nearest to `wanted` that lies inside `interior` and keeps
/// [`ANCHOR_BOX_GAP`] from every taken box. Shrinks two tiles at a time
/// down to [`MIN_ANCHOR_BOX`].
fn disjoint_box(wanted: Rect, taken: &[Rect], interior: &Rect) -> Option<Rect> {
    let is_free = |r: &Rect| {
        interior.contains_rect(r)
            && !taken.iter().any(|t| t.inflate(ANCHOR_BOX_GAP).intersects(r))
    };
    let center = wanted.center();
    let reach = interior.w.max(interior.h);
    let mut side = wanted.w;

    loop {
        let candidate = Rect::centered(center, Size::new(side, side)).clamped_into(interior);
        if is_free(&candidate) {
            return Some(candidate);
        }
        let size = candidate.size();
        let shifted = (1..=reach).find_map(|r| {
            ring(candidate.origin(), r)
                .map(|origin| Rect::at(origin, size))
                .find(|r| is_free(r))
        });
        if shifted.is_some() {
            return shifted;
        }
        if side <= MIN_ANCHOR_BOX {
            return None;
        }
        side = (side - 2).max(MIN_ANCHOR_BOX);
    }
}

/// Pick and run the organism layout for an anchor.
pub fn lay_out_anchor(
    anchor: &AnchorDefinition,
    bounds: Rect,
    seed: u64,
    archetypes: &dyn ArchetypeSource,
) -> OrganismLayout {
    let instance_ids = anchor.instance_ids();
    match &anchor.kind {
        AnchorKind::Town(town) if town.size == TownSize::Hamlet => {
            if !town.services.is_empty() {
                tracing::warn!(
                    anchor = %anchor.id,
                    "Hamlets have no service buildings; services ignored"
                );
            }
            let config = HamletConfig {
                house_count: town.house_count,
                place_well: town.central_feature.as_deref() != Some("none"),
                ..HamletConfig::default()
            };
            OrganismLayout::Hamlet(layout_hamlet(bounds, &config, seed, archetypes))
        }
        AnchorKind::Town(town) => {
            OrganismLayout::Town(layout_town(bounds, town, &instance_ids, seed, archetypes))
        }
        other => OrganismLayout::Landmark(layout_landmark(
            bounds,
            other.tag(),
            &instance_ids,
            archetypes,
        )),
    }
}

/// Tiles at Chebyshev distance `r` from `center`, row-major.
fn ring(center: TilePos, r: i32) -> impl Iterator<Item = TilePos> {
    (-r..=r).flat_map(move |dy| {
        (-r..=r)
            .filter(move |dx| dx.abs() == r || dy.abs() == r)
            .map(move |dx| center.offset(dx, dy))
    })
}

/// Move `entry` to the nearest tile a road of `width` can be centred on.
///
/// Returns `None` when nothing within [`MAX_NUDGE_RADIUS`] qualifies.
#[must_use]
pub fn nudge_entry(grid: &CollisionGrid, entry: TilePos, width: u32) -> Option<TilePos> {
    if grid.is_passable_for_width(entry, width) {
        return Some(entry);
    }
    (1..=MAX_NUDGE_RADIUS)
        .find_map(|r| ring(entry, r).find(|&p| grid.is_passable_for_width(p, width)))
}

/// A jittered standing spot near `center` for an NPC the layout did not
/// place, moved onto walkable ground when it lands on something solid.
pub fn default_npc_position(grid: &CollisionGrid, center: TilePos, rng: &mut SeededRng) -> TilePos {
    let dx = rng.range(-NPC_SPREAD, NPC_SPREAD + 1);
    let dy = rng.range(-NPC_SPREAD, NPC_SPREAD + 1);
    let spot = center.offset(dx, dy);
    nudge_entry(grid, spot, 1).unwrap_or(spot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PositionHint;
    use crate::grid::TileState;

    fn anchor(id: &str, position: PositionHint) -> AnchorDefinition {
        AnchorDefinition {
            id: id.into(),
            name: String::new(),
            kind: AnchorKind::Shrine,
            position,
            npcs: Vec::new(),
            events: Vec::new(),
            quests: Vec::new(),
            world_slots: Vec::new(),
        }
    }

    #[test]
    fn test_positioning_order() {
        let anchors = vec![
            anchor("side", PositionHint::Side),
            anchor("end", PositionHint::End),
            anchor("fixed", PositionHint::At { x: 40, y: 40 }),
            anchor("start", PositionHint::Start),
            anchor("middle", PositionHint::Middle),
            anchor("start2", PositionHint::Start),
        ];
        let order: Vec<_> = positioning_order(&anchors)
            .into_iter()
            .map(|i| anchors[i].id.as_str())
            .collect();
        assert_eq!(order, vec!["fixed", "start", "start2", "middle", "end", "side"]);
    }

    #[test]
    fn test_explicit_box_is_centred_and_clamped() {
        let interior = anchor_interior(100, 3);
        assert_eq!(interior, Rect::new(5, 5, 90, 90));
        let anchors = vec![
            anchor("a", PositionHint::At { x: 50, y: 50 }),
            anchor("b", PositionHint::At { x: 0, y: 99 }),
        ];
        let boxes = anchor_boxes(&anchors, interior, &mut SeededRng::new(1));
        assert_eq!(boxes[0].bounds, Rect::new(43, 43, 15, 15));
        assert_eq!(boxes[1].bounds, Rect::new(5, 80, 15, 15));
        assert!(!boxes[1].is_adjusted());
    }

    #[test]
    fn test_hinted_boxes_inside_interior() {
        let interior = anchor_interior(120, 3);
        let anchors: Vec<_> = (0..5)
            .map(|i| anchor(&format!("a{i}"), PositionHint::Middle))
            .collect();
        for seed in 0..10 {
            let boxes = anchor_boxes(&anchors, interior, &mut SeededRng::new(seed));
            for b in &boxes {
                assert!(interior.contains_rect(&b.bounds));
            }
        }
    }

    fn village(id: &str) -> AnchorDefinition {
        let mut a = anchor(id, PositionHint::Middle);
        a.kind = AnchorKind::Town(crate::data::TownDefinition::default());
        a
    }

    #[test]
    fn test_crowded_boxes_are_moved_apart() {
        let interior = anchor_interior(80, 3);
        let anchors = vec![
            village("v1"),
            village("v2"),
            village("v3"),
            anchor("s", PositionHint::Middle),
        ];
        for seed in 0..10 {
            let boxes = anchor_boxes(&anchors, interior, &mut SeededRng::new(seed));
            assert!(boxes.iter().any(AnchorBox::is_adjusted));
            for (i, a) in boxes.iter().enumerate() {
                assert!(!a.overlapping);
                assert!(interior.contains_rect(&a.bounds));
                assert!(a.bounds.w >= MIN_ANCHOR_BOX);
                for b in &boxes[i + 1..] {
                    assert!(!a.bounds.inflate(ANCHOR_BOX_GAP).intersects(&b.bounds));
                }
            }
        }
    }

    #[test]
    fn test_explicit_boxes_on_top_of_each_other() {
        let interior = anchor_interior(100, 3);
        let anchors = vec![
            anchor("a", PositionHint::At { x: 50, y: 50 }),
            anchor("b", PositionHint::At { x: 50, y: 50 }),
        ];
        let boxes = anchor_boxes(&anchors, interior, &mut SeededRng::new(1));
        assert!(!boxes[0].is_adjusted());
        assert_eq!(boxes[1].requested, boxes[0].bounds);
        assert!(boxes[1].is_adjusted());
        assert!(!boxes[0].bounds.inflate(ANCHOR_BOX_GAP).intersects(&boxes[1].bounds));
    }

    #[test]
    fn test_box_left_overlapping_when_nothing_fits() {
        let interior = Rect::new(0, 0, 20, 20);
        let anchors = vec![
            anchor("a", PositionHint::Start),
            anchor("b", PositionHint::End),
        ];
        let boxes = anchor_boxes(&anchors, interior, &mut SeededRng::new(3));
        assert!(!boxes[0].overlapping);
        assert!(boxes[1].overlapping);
        assert_eq!(boxes[1].bounds, boxes[1].requested);
    }

    #[test]
    fn test_nudge_entry() {
        let mut grid = CollisionGrid::new(20, 20);
        grid.mark_area(5, 5, 5, 5, TileState::Blocked);
        let inside = TilePos::new(7, 7);
        let nudged = nudge_entry(&grid, inside, 3).unwrap();
        assert!(grid.is_passable_for_width(nudged, 3));
        assert!(nudged.manhattan(inside) <= 2 * MAX_NUDGE_RADIUS as u32);

        let open = TilePos::new(15, 15);
        assert_eq!(nudge_entry(&grid, open, 3), Some(open));

        let mut solid = CollisionGrid::new(10, 10);
        solid.mark_area(0, 0, 10, 10, TileState::Blocked);
        assert_eq!(nudge_entry(&solid, TilePos::new(5, 5), 1), None);
    }

    #[test]
    fn test_dispatch_by_kind() {
        use crate::archetype::ArchetypeRegistry;
        use crate::data::TownDefinition;

        let registry = ArchetypeRegistry::new();
        let bounds = Rect::new(0, 0, 40, 40);

        let mut hamlet = anchor("h", PositionHint::Middle);
        hamlet.kind = AnchorKind::Town(TownDefinition {
            size: TownSize::Hamlet,
            house_count: 3,
            ..Default::default()
        });
        assert!(matches!(lay_out_anchor(&hamlet, bounds, 1, &registry), OrganismLayout::Hamlet(_)));

        let mut town = anchor("t", PositionHint::Middle);
        town.kind = AnchorKind::Town(TownDefinition::default());
        assert!(matches!(lay_out_anchor(&town, bounds, 1, &registry), OrganismLayout::Town(_)));

        let shrine = anchor("s", PositionHint::Middle);
        assert!(matches!(
            lay_out_anchor(&shrine, bounds, 1, &registry),
            OrganismLayout::Landmark(_)
        ));
    }
}
