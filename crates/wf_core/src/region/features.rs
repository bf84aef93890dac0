//! Wild features and safe zones: points of interest away from the anchors.

use serde::{Deserialize, Serialize};

use crate::data::{WildFeatureRule, WildPlacement};
use crate::fill::in_edge_band;
use crate::grid::{CollisionGrid, TileState};
use crate::math::{Rect, Size, TilePos};
use crate::rng::SeededRng;
use crate::router::{PathPriority, RoutedPath};
use crate::traversal::{bfs_flood_fill, DistanceField};

/// Minimum Manhattan spacing between two wild features.
pub const WILD_FEATURE_SPACING: u32 = 10;
/// Candidate draws per requested feature.
const ATTEMPTS_PER_FEATURE: u32 = 50;

const NEAR_PATH_MIN: u32 = 5;
const NEAR_PATH_MAX: u32 = 8;
const OFF_PATH_MIN: u32 = 15;
const HIDDEN_CORNER_REACH: i32 = 10;
const HIDDEN_EDGE_REACH: i32 = 5;
const HIDDEN_MIN_ROAD_DISTANCE: u32 = 8;

/// Side of a safe-zone clearing.
pub const SAFE_ZONE_SIDE: i32 = 5;
/// Tiles walked per minute of play.
pub const TILES_PER_MINUTE: u32 = 60 * 4;

/// A placed wild feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildFeature {
    /// Feature kind label.
    pub kind: String,
    /// Placement rule it satisfied.
    pub placement: WildPlacement,
    /// Tile.
    pub position: TilePos,
}

/// A wild-feature rule that ran out of attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildShortfall {
    /// Feature kind label.
    pub kind: String,
    /// Requested count.
    pub requested: u32,
    /// Placed count.
    pub placed: u32,
}

/// A rest clearing beside a main road.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeZone {
    /// Reserved area.
    pub area: Rect,
    /// Label of the road it sits on.
    pub road: String,
}

/// Distance from every walkable tile to the nearest road tile.
#[must_use]
pub fn road_distance_field(grid: &CollisionGrid) -> DistanceField {
    let roads: Vec<TilePos> = grid
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == TileState::Road)
        .map(|(i, _)| grid.pos_of(i))
        .collect();
    bfs_flood_fill(grid, &roads)
}

fn matches_placement(
    placement: WildPlacement,
    p: TilePos,
    bounds: &Rect,
    road_distance: Option<u32>,
) -> bool {
    match placement {
        WildPlacement::NearPath => {
            road_distance.is_some_and(|d| (NEAR_PATH_MIN..=NEAR_PATH_MAX).contains(&d))
        }
        WildPlacement::OffPath => road_distance.map_or(true, |d| d >= OFF_PATH_MIN),
        WildPlacement::Hidden => {
            let from_x = (p.x - bounds.x).min(bounds.right() - 1 - p.x);
            let from_y = (p.y - bounds.y).min(bounds.bottom() - 1 - p.y);
            let near_corner = from_x <= HIDDEN_CORNER_REACH && from_y <= HIDDEN_CORNER_REACH;
            let near_edge = from_x.min(from_y) <= HIDDEN_EDGE_REACH;
            let far_from_road = road_distance.map_or(true, |d| d >= HIDDEN_MIN_ROAD_DISTANCE);
            near_corner || (near_edge && far_from_road)
        }
    }
}

/// Place wild features for every rule, marking each placed tile reserved.
pub fn place_wild_features(
    grid: &mut CollisionGrid,
    rules: &[WildFeatureRule],
    edge_depth: u32,
    rng: &mut SeededRng,
) -> (Vec<WildFeature>, Vec<WildShortfall>) {
    let field = road_distance_field(grid);
    let bounds = grid.bounds();
    let (w, h) = (grid.width() as i32, grid.height() as i32);

    let mut placed: Vec<WildFeature> = Vec::new();
    let mut shortfalls = Vec::new();

    for rule in rules {
        let mut count = 0;
        let max_attempts = rule.count.saturating_mul(ATTEMPTS_PER_FEATURE);
        let mut attempts = 0;
        while count < rule.count && attempts < max_attempts {
            attempts += 1;
            let p = TilePos::new(rng.range(0, w), rng.range(0, h));

            if grid.get(p) != Some(TileState::Passable) || in_edge_band(&bounds, p, edge_depth) {
                continue;
            }
            if !matches_placement(rule.placement, p, &bounds, field.distance(p)) {
                continue;
            }
            if placed
                .iter()
                .any(|f| f.position.manhattan(p) < WILD_FEATURE_SPACING)
            {
                continue;
            }

            grid.set(p, TileState::Reserved);
            placed.push(WildFeature {
                kind: rule.kind.clone(),
                placement: rule.placement,
                position: p,
            });
            count += 1;
        }

        if count < rule.count {
            shortfalls.push(WildShortfall {
                kind: rule.kind.clone(),
                requested: rule.count,
                placed: count,
            });
        }
    }

    (placed, shortfalls)
}

/// Candidate clearings around a road tile: right, left, below, above.
fn clearing_candidates(p: TilePos) -> [Rect; 4] {
    let size = Size::new(SAFE_ZONE_SIDE, SAFE_ZONE_SIDE);
    [
        Rect::at(p.offset(3, -2), size),
        Rect::at(p.offset(-7, -2), size),
        Rect::at(p.offset(-2, 3), size),
        Rect::at(p.offset(-2, -7), size),
    ]
}

/// Reserve a clearing every `step_tiles` tiles along each main road.
pub fn place_safe_zones(
    grid: &mut CollisionGrid,
    paths: &[RoutedPath],
    step_tiles: usize,
    edge_depth: u32,
    rng: &mut SeededRng,
) -> Vec<SafeZone> {
    if step_tiles == 0 {
        return Vec::new();
    }
    let interior = grid.bounds().inflate(-(edge_depth as i32));
    let mut zones = Vec::new();

    for path in paths.iter().filter(|p| p.request.priority == PathPriority::Main) {
        for &p in path.waypoints.iter().skip(step_tiles).step_by(step_tiles) {
            let mut candidates = clearing_candidates(p);
            rng.shuffle(&mut candidates);
            let found = candidates
                .into_iter()
                .find(|area| interior.contains_rect(area) && grid.is_area_clear(area));
            if let Some(area) = found {
                grid.mark_area(area.x, area.y, area.w, area.h, TileState::Reserved);
                zones.push(SafeZone {
                    area,
                    road: path.request.label.clone(),
                });
            }
        }
    }

    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::router::PathRequest;

    fn rule(kind: &str, placement: WildPlacement, count: u32) -> WildFeatureRule {
        WildFeatureRule {
            kind: kind.into(),
            placement,
            count,
        }
    }

    fn grid_with_road() -> CollisionGrid {
        let mut grid = CollisionGrid::new(100, 100);
        grid.mark_area(0, 50, 100, 1, TileState::Road);
        grid
    }

    #[test]
    fn test_near_path_distance() {
        let mut grid = grid_with_road();
        let (features, _) = place_wild_features(
            &mut grid,
            &[rule("campfire", WildPlacement::NearPath, 4)],
            3,
            &mut SeededRng::new(5),
        );
        assert!(!features.is_empty());
        for f in &features {
            let d = f.position.y.abs_diff(50);
            assert!((5..=8).contains(&d), "{f:?}");
            assert_eq!(grid.get(f.position), Some(TileState::Reserved));
        }
    }

    #[test]
    fn test_off_path_and_spacing() {
        let mut grid = grid_with_road();
        let (features, _) = place_wild_features(
            &mut grid,
            &[rule("ruin", WildPlacement::OffPath, 6)],
            3,
            &mut SeededRng::new(11),
        );
        for (i, a) in features.iter().enumerate() {
            assert!(a.position.y.abs_diff(50) >= 15);
            assert!(!in_edge_band(&grid.bounds(), a.position, 3));
            for b in &features[i + 1..] {
                assert!(a.position.manhattan(b.position) >= WILD_FEATURE_SPACING);
            }
        }
    }

    #[test]
    fn test_hidden_near_corner_or_edge() {
        let mut grid = grid_with_road();
        let (features, _) = place_wild_features(
            &mut grid,
            &[rule("cache", WildPlacement::Hidden, 3)],
            3,
            &mut SeededRng::new(2),
        );
        for f in &features {
            let p = f.position;
            let from_x = p.x.min(99 - p.x);
            let from_y = p.y.min(99 - p.y);
            assert!((from_x <= 10 && from_y <= 10) || from_x.min(from_y) <= 5);
        }
    }

    #[test]
    fn test_shortfall_when_no_room() {
        let mut grid = CollisionGrid::new(30, 30);
        grid.mark_area(0, 0, 30, 30, TileState::Blocked);
        let (features, shortfalls) = place_wild_features(
            &mut grid,
            &[rule("ruin", WildPlacement::OffPath, 2)],
            3,
            &mut SeededRng::new(1),
        );
        assert!(features.is_empty());
        assert_eq!(shortfalls[0].requested, 2);
        assert_eq!(shortfalls[0].placed, 0);
    }

    #[test]
    fn test_safe_zones_along_main_road() {
        let mut grid = CollisionGrid::new(100, 40);
        let waypoints: Vec<_> = (0..100).map(|x| TilePos::new(x, 20)).collect();
        for &p in &waypoints {
            grid.stamp_road(p, 3);
        }
        let path = RoutedPath {
            request: PathRequest {
                from: waypoints[0],
                to: waypoints[99],
                priority: PathPriority::Main,
                width: 3,
                label: "main:a->b".into(),
            },
            waypoints,
            cost: Fixed::from_num(50),
        };

        let zones = place_safe_zones(&mut grid, &[path], 30, 3, &mut SeededRng::new(8));
        // Waypoints 30, 60 and 90.
        assert_eq!(zones.len(), 3);
        for zone in &zones {
            assert_eq!(zone.road, "main:a->b");
            assert!(zone.area.tiles().all(|t| grid.get(t) == Some(TileState::Reserved)));
            assert!(!zone.area.intersects(&Rect::new(0, 19, 100, 3)));
        }
    }

    #[test]
    fn test_branch_roads_get_no_safe_zones() {
        let mut grid = CollisionGrid::new(100, 40);
        let waypoints: Vec<_> = (0..100).map(|x| TilePos::new(x, 20)).collect();
        let path = RoutedPath {
            request: PathRequest {
                from: waypoints[0],
                to: waypoints[99],
                priority: PathPriority::Branch,
                width: 1,
                label: "branch".into(),
            },
            waypoints,
            cost: Fixed::from_num(99),
        };
        assert!(place_safe_zones(&mut grid, &[path], 30, 3, &mut SeededRng::new(8)).is_empty());
    }
}
