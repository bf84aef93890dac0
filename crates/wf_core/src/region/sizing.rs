//! Region frame: map size from the time budget, exits and gate tiles.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::{Compass, ConnectionType};
use crate::math::{Rect, TilePos};

/// Walking speed in tiles per second.
pub const WALK_TILES_PER_SECOND: u32 = 4;
/// One in this many seconds of the play budget is spent walking.
pub const WALKING_SHARE_DIVISOR: u32 = 4;
/// Tiles spanned by one screen.
pub const SCREEN_TILES: u32 = 16;
/// Smallest region side.
pub const MIN_REGION_SIDE: u32 = 80;
/// Largest region side.
pub const MAX_REGION_SIDE: u32 = 200;

/// Side length of the (square) region map for a play budget.
///
/// ```
/// use wf_core::region::region_side;
///
/// assert_eq!(region_side(5), 80);
/// assert_eq!(region_side(10), 98);
/// assert_eq!(region_side(120), 200);
/// ```
#[must_use]
pub fn region_side(time_budget_minutes: u32) -> u32 {
    let walk_tiles = f64::from(time_budget_minutes) * 60.0 * f64::from(WALK_TILES_PER_SECOND)
        / f64::from(WALKING_SHARE_DIVISOR);
    let side = (walk_tiles * f64::from(SCREEN_TILES)).sqrt().round() as u32;
    side.clamp(MIN_REGION_SIDE, MAX_REGION_SIDE)
}

/// An exit the world composer asks a region to provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRequest {
    /// Region on the other side.
    pub target: String,
    /// Map side the exit sits on.
    pub side: Compass,
    /// Connection type.
    pub kind: ConnectionType,
}

/// A resolved region exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionExit {
    /// Region on the other side.
    pub target: String,
    /// Map side.
    pub side: Compass,
    /// Connection type.
    pub kind: ConnectionType,
    /// Exit tile, just inside the border.
    pub position: TilePos,
}

/// Place exits along their sides.
///
/// Exits sharing a side are spread evenly along it, in request order, and
/// inset by half the road width so a full-width road fits at the border.
#[must_use]
pub fn plan_exits(side_len: u32, requests: &[ExitRequest], road_width: u32) -> Vec<RegionExit> {
    let side_len = side_len as i32;
    let inset = (road_width / 2) as i32;

    let total_on = |side: Compass| requests.iter().filter(|r| r.side == side).count() as i32;
    let mut seen: Vec<Compass> = Vec::with_capacity(requests.len());

    requests
        .iter()
        .map(|request| {
            let side = request.side;
            let k = seen.iter().filter(|&&s| s == side).count() as i32;
            seen.push(side);
            let along = side_len * (k + 1) / (total_on(side) + 1);
            let position = match side {
                Compass::North => TilePos::new(along, inset),
                Compass::South => TilePos::new(along, side_len - 1 - inset),
                Compass::West => TilePos::new(inset, along),
                Compass::East => TilePos::new(side_len - 1 - inset, along),
            };
            RegionExit {
                target: request.target.clone(),
                side,
                kind: request.kind,
                position,
            }
        })
        .collect()
}

/// Half-width of a gate, in tiles either side of the exit.
#[must_use]
pub const fn gate_half_width(road_width: u32) -> i32 {
    ((road_width + 2) / 2) as i32
}

/// Edge-band tiles that must stay open so each exit leads off the map.
#[must_use]
pub fn gate_tiles(
    bounds: &Rect,
    exits: &[RegionExit],
    edge_depth: u32,
    road_width: u32,
) -> BTreeSet<TilePos> {
    let half = gate_half_width(road_width);
    let depth = edge_depth as i32;
    let mut tiles = BTreeSet::new();

    for exit in exits {
        let p = exit.position;
        let band = match exit.side {
            Compass::North => Rect::new(p.x - half, bounds.y, half * 2 + 1, depth),
            Compass::South => Rect::new(p.x - half, bounds.bottom() - depth, half * 2 + 1, depth),
            Compass::West => Rect::new(bounds.x, p.y - half, depth, half * 2 + 1),
            Compass::East => Rect::new(bounds.right() - depth, p.y - half, depth, half * 2 + 1),
        };
        tiles.extend(band.tiles().filter(|t| bounds.contains(*t)));
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target: &str, side: Compass) -> ExitRequest {
        ExitRequest {
            target: target.into(),
            side,
            kind: ConnectionType::Road,
        }
    }

    #[test]
    fn test_region_side_formula() {
        assert_eq!(region_side(1), MIN_REGION_SIDE);
        // 30 min: sqrt(1800 * 16) = 169.7
        assert_eq!(region_side(30), 170);
        assert_eq!(region_side(600), MAX_REGION_SIDE);
    }

    #[test]
    fn test_exits_spread_along_side() {
        let exits = plan_exits(
            90,
            &[
                request("a", Compass::North),
                request("b", Compass::North),
                request("c", Compass::West),
            ],
            3,
        );
        assert_eq!(exits[0].position, TilePos::new(30, 1));
        assert_eq!(exits[1].position, TilePos::new(60, 1));
        assert_eq!(exits[2].position, TilePos::new(1, 45));
        assert_eq!(exits[2].target, "c");
    }

    #[test]
    fn test_exit_inset_follows_road_width() {
        let exits = plan_exits(80, &[request("a", Compass::South), request("b", Compass::East)], 1);
        assert_eq!(exits[0].position, TilePos::new(40, 79));
        assert_eq!(exits[1].position, TilePos::new(79, 40));
    }

    #[test]
    fn test_gate_width_uses_integer_division() {
        assert_eq!(gate_half_width(3), 2);
        assert_eq!(gate_half_width(1), 1);
        assert_eq!(gate_half_width(4), 3);
    }

    #[test]
    fn test_gate_tiles_cover_band() {
        let bounds = Rect::new(0, 0, 80, 80);
        let exits = plan_exits(80, &[request("a", Compass::North)], 3);
        let gates = gate_tiles(&bounds, &exits, 3, 3);
        // 5 columns x 3 rows.
        assert_eq!(gates.len(), 15);
        assert!(gates.contains(&TilePos::new(38, 0)));
        assert!(gates.contains(&TilePos::new(42, 2)));
        assert!(!gates.contains(&TilePos::new(40, 3)));
    }
}
