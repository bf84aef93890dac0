//! Road routing using A* over the collision grid.
//!
//! All costs use fixed-point math so the search order (and therefore every
//! waypoint) is identical on every platform. Roads are stamped into the grid
//! as soon as they are routed, which makes later requests prefer to share
//! them.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::grid::{CollisionGrid, TileState};
use crate::math::{fixed_serde, Fixed, TilePos};

/// Cost of stepping onto a road tile.
const ROAD_COST: Fixed = Fixed::from_bits(1 << 31);
/// Cost of stepping onto a reserved tile.
const RESERVED_COST: Fixed = Fixed::const_from_int(3);
/// Cost of stepping onto open ground.
const GROUND_COST: Fixed = Fixed::ONE;

/// 4-directional movement: east, south, west, north.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Routing order class. Lower routes first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PathPriority {
    /// Anchor-to-anchor and exit roads.
    Main,
    /// Optional shortcuts between nearby anchors.
    Branch,
    /// Footpaths inside an organism.
    Internal,
}

/// A request to connect two tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRequest {
    /// Start tile.
    pub from: TilePos,
    /// Goal tile.
    pub to: TilePos,
    /// Routing order.
    pub priority: PathPriority,
    /// Road width in tiles.
    pub width: u32,
    /// Human readable description, used in reports.
    pub label: String,
}

/// A successfully routed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedPath {
    /// The request.
    pub request: PathRequest,
    /// Every tile from start to goal inclusive.
    pub waypoints: Vec<TilePos>,
    /// Total step cost.
    #[serde(with = "fixed_serde")]
    pub cost: Fixed,
}

impl RoutedPath {
    /// Number of tiles on the path.
    #[must_use]
    pub fn length(&self) -> usize {
        self.waypoints.len()
    }
}

/// Output of [`route_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingResult {
    /// Routed paths in routing order.
    pub routed: Vec<RoutedPath>,
    /// Requests for which no path was found, in routing order.
    pub unrouted: Vec<PathRequest>,
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    index: usize,
    f_score: Fixed,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse for lowest f first, then lowest
        // row-major index for equal scores.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.index.cmp(&self.index),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn step_cost(state: TileState) -> Fixed {
    match state {
        TileState::Road => ROAD_COST,
        TileState::Reserved => RESERVED_COST,
        TileState::Passable | TileState::Blocked => GROUND_COST,
    }
}

/// Manhattan distance with a tiny penalty on the shorter axis, which breaks
/// ties between equally long paths in favour of straight runs.
fn heuristic(a: TilePos, b: TilePos) -> Fixed {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    Fixed::from_num(dx + dy) + Fixed::from_num(dx.min(dy)) / 1000
}

/// Find the cheapest path from `from` to `to` for a road of `width`.
///
/// Returns `None` when either end is not passable for the width, when the
/// goal is unreachable, or when the search expands more than twice the
/// grid's cell count.
#[must_use]
pub fn find_path(
    grid: &CollisionGrid,
    from: TilePos,
    to: TilePos,
    width: u32,
) -> Option<RoutedPath> {
    find_path_inner(grid, from, to, width).map(|(waypoints, cost)| RoutedPath {
        request: PathRequest {
            from,
            to,
            priority: PathPriority::Main,
            width,
            label: String::new(),
        },
        waypoints,
        cost,
    })
}

fn find_path_inner(
    grid: &CollisionGrid,
    from: TilePos,
    to: TilePos,
    width: u32,
) -> Option<(Vec<TilePos>, Fixed)> {
    if !grid.is_passable_for_width(from, width) || !grid.is_passable_for_width(to, width) {
        return None;
    }
    let start = grid.index_of(from)?;
    let goal = grid.index_of(to)?;
    if start == goal {
        return Some((vec![from], Fixed::ZERO));
    }

    let cell_count = grid.cells().len();
    let max_expansions = cell_count * 2;

    let mut g_score = vec![Fixed::MAX; cell_count];
    let mut came_from = vec![usize::MAX; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open_set = BinaryHeap::new();

    g_score[start] = Fixed::ZERO;
    open_set.push(AStarNode {
        index: start,
        f_score: heuristic(from, to),
    });

    let mut expansions = 0usize;
    while let Some(current) = open_set.pop() {
        if current.index == goal {
            return Some((reconstruct_path(grid, &came_from, goal), g_score[goal]));
        }
        if closed[current.index] {
            continue;
        }
        closed[current.index] = true;

        expansions += 1;
        if expansions > max_expansions {
            tracing::debug!(%from, %to, expansions, "A* expansion cap reached");
            return None;
        }

        let pos = grid.pos_of(current.index);
        let current_g = g_score[current.index];

        for &(dx, dy) in &DIRECTIONS {
            let next = pos.offset(dx, dy);
            let Some(ni) = grid.index_of(next) else {
                continue;
            };
            if closed[ni] || !grid.is_passable_for_width(next, width) {
                continue;
            }

            let tentative_g = current_g + step_cost(grid.cells()[ni]);
            if tentative_g < g_score[ni] {
                came_from[ni] = current.index;
                g_score[ni] = tentative_g;
                open_set.push(AStarNode {
                    index: ni,
                    f_score: tentative_g + heuristic(next, to),
                });
            }
        }
    }

    None
}

fn reconstruct_path(grid: &CollisionGrid, came_from: &[usize], goal: usize) -> Vec<TilePos> {
    let mut path = vec![grid.pos_of(goal)];
    let mut current = goal;
    while came_from[current] != usize::MAX {
        current = came_from[current];
        path.push(grid.pos_of(current));
    }
    path.reverse();
    path
}

/// Route every request in priority order, stamping each accepted path into
/// the grid before the next request is routed.
///
/// The sort is stable, so requests of equal priority keep their input order.
pub fn route_all(grid: &mut CollisionGrid, mut requests: Vec<PathRequest>) -> RoutingResult {
    requests.sort_by_key(|r| r.priority);

    let mut result = RoutingResult::default();
    for request in requests {
        match find_path_inner(grid, request.from, request.to, request.width) {
            Some((waypoints, cost)) => {
                for &p in &waypoints {
                    grid.stamp_road(p, request.width);
                }
                tracing::debug!(label = %request.label, tiles = waypoints.len(), "Path routed");
                result.routed.push(RoutedPath {
                    request,
                    waypoints,
                    cost,
                });
            }
            None => {
                tracing::warn!(
                    label = %request.label,
                    from = %request.from,
                    to = %request.to,
                    "No route found"
                );
                result.unrouted.push(request);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn request(from: TilePos, to: TilePos, priority: PathPriority, width: u32) -> PathRequest {
        PathRequest {
            from,
            to,
            priority,
            width,
            label: format!("{from}->{to}"),
        }
    }

    #[test]
    fn test_road_cost_is_half() {
        assert_eq!(ROAD_COST, Fixed::from_num(0.5));
    }

    #[test]
    fn test_same_start_and_goal() {
        let grid = CollisionGrid::new(10, 10);
        let path = find_path(&grid, TilePos::new(3, 3), TilePos::new(3, 3), 1).unwrap();
        assert_eq!(path.waypoints, vec![TilePos::new(3, 3)]);
        assert_eq!(path.cost, Fixed::ZERO);
    }

    #[test]
    fn test_straight_path() {
        let grid = CollisionGrid::new(10, 10);
        let path = find_path(&grid, TilePos::new(0, 5), TilePos::new(9, 5), 1).unwrap();
        assert_eq!(path.length(), 10);
        assert_eq!(path.cost, Fixed::from_num(9));
        // 4-directional: consecutive waypoints are neighbours.
        for pair in path.waypoints.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
    }

    #[test]
    fn test_path_through_gap() {
        let mut grid = CollisionGrid::new(10, 10);
        grid.mark_area(5, 0, 1, 10, TileState::Blocked);
        grid.set(TilePos::new(5, 8), TileState::Passable);

        let path = find_path(&grid, TilePos::new(0, 0), TilePos::new(9, 0), 1).unwrap();
        assert!(path.waypoints.contains(&TilePos::new(5, 8)));
        assert!(path.waypoints.iter().all(|&p| grid.is_walkable(p)));
    }

    #[test]
    fn test_wide_road_avoids_narrow_gap() {
        let mut grid = CollisionGrid::new(20, 20);
        grid.mark_area(10, 0, 1, 20, TileState::Blocked);
        grid.set(TilePos::new(10, 5), TileState::Passable);

        assert!(find_path(&grid, TilePos::new(2, 5), TilePos::new(17, 5), 1).is_some());
        assert!(find_path(&grid, TilePos::new(2, 5), TilePos::new(17, 5), 3).is_none());
    }

    #[test]
    fn test_blocked_goal() {
        let mut grid = CollisionGrid::new(10, 10);
        grid.set(TilePos::new(9, 9), TileState::Blocked);
        assert!(find_path(&grid, TilePos::new(0, 0), TilePos::new(9, 9), 1).is_none());
        assert!(find_path(&grid, TilePos::new(0, 0), TilePos::new(20, 20), 1).is_none());
    }

    #[test]
    fn test_reserved_is_avoided_when_cheap_to_do_so() {
        let mut grid = CollisionGrid::new(12, 7);
        grid.mark_area(5, 2, 3, 3, TileState::Reserved);
        let path = find_path(&grid, TilePos::new(0, 3), TilePos::new(11, 3), 1).unwrap();
        assert!(path
            .waypoints
            .iter()
            .all(|&p| grid.get(p) != Some(TileState::Reserved)));
    }

    #[test]
    fn test_route_all_orders_by_priority_and_stamps() {
        let mut grid = CollisionGrid::new(40, 20);
        let requests = vec![
            request(TilePos::new(2, 10), TilePos::new(30, 15), PathPriority::Branch, 1),
            request(TilePos::new(2, 10), TilePos::new(37, 10), PathPriority::Main, 1),
        ];
        let result = route_all(&mut grid, requests);

        assert!(result.unrouted.is_empty());
        assert_eq!(result.routed[0].request.priority, PathPriority::Main);
        assert_eq!(result.routed[1].request.priority, PathPriority::Branch);

        let main: HashSet<_> = result.routed[0].waypoints.iter().copied().collect();
        let branch = &result.routed[1];
        let shared = branch.waypoints.iter().filter(|p| main.contains(p)).count();
        assert!(shared > 10, "branch shares only {shared} road tiles");
        assert!(branch.cost < Fixed::from_num(branch.length() - 1));

        for p in &result.routed[0].waypoints {
            assert_eq!(grid.get(*p), Some(TileState::Road));
        }
    }

    #[test]
    fn test_route_all_records_unrouted() {
        let mut grid = CollisionGrid::new(10, 10);
        grid.mark_area(5, 0, 1, 10, TileState::Blocked);
        let result = route_all(
            &mut grid,
            vec![request(TilePos::new(0, 0), TilePos::new(9, 9), PathPriority::Main, 1)],
        );
        assert!(result.routed.is_empty());
        assert_eq!(result.unrouted.len(), 1);
    }

    #[test]
    fn test_deterministic_waypoints() {
        let mut grid = CollisionGrid::new(30, 30);
        grid.mark_area(10, 5, 3, 20, TileState::Blocked);
        let a = find_path(&grid, TilePos::new(0, 15), TilePos::new(29, 14), 1).unwrap();
        let b = find_path(&grid, TilePos::new(0, 15), TilePos::new(29, 14), 1).unwrap();
        assert_eq!(a, b);
    }
}
