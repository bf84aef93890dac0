//! Traversal verification: prove that entries reach targets.
//!
//! Pure functions over a finished grid. Nothing here mutates the grid or
//! tries to fix what it finds.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::grid::CollisionGrid;
use crate::math::TilePos;

/// Distance value of cells no entry reaches.
pub const UNREACHED: u32 = u32::MAX;

/// 4-directional neighbours.
const NEIGHBOURS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Multi-source BFS result.
///
/// Distances default to [`UNREACHED`] so callers can tell blocked or isolated
/// cells from reachable ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<u32>,
    origins: Vec<Option<TilePos>>,
}

impl DistanceField {
    fn index_of(&self, p: TilePos) -> Option<usize> {
        (p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height)
            .then(|| (p.y as usize) * (self.width as usize) + (p.x as usize))
    }

    /// Steps from the nearest entry, `None` when unreached.
    #[must_use]
    pub fn distance(&self, p: TilePos) -> Option<u32> {
        self.index_of(p)
            .map(|i| self.distances[i])
            .filter(|&d| d != UNREACHED)
    }

    /// The entry that reached `p` first.
    #[must_use]
    pub fn origin(&self, p: TilePos) -> Option<TilePos> {
        self.index_of(p).and_then(|i| self.origins[i])
    }

    /// Whether any entry reaches `p`.
    #[must_use]
    pub fn is_reached(&self, p: TilePos) -> bool {
        self.distance(p).is_some()
    }

    /// Raw row-major distances.
    #[must_use]
    pub fn distances(&self) -> &[u32] {
        &self.distances
    }
}

/// Multi-source 4-directional BFS over walkable cells.
///
/// Entries that are blocked or out of bounds are skipped. Ties between
/// entries go to the one listed first.
#[must_use]
pub fn bfs_flood_fill(grid: &CollisionGrid, entries: &[TilePos]) -> DistanceField {
    let cell_count = grid.cells().len();
    let mut field = DistanceField {
        width: grid.width(),
        height: grid.height(),
        distances: vec![UNREACHED; cell_count],
        origins: vec![None; cell_count],
    };

    let mut queue = VecDeque::new();
    for &entry in entries {
        if !grid.is_walkable(entry) {
            continue;
        }
        let Some(i) = grid.index_of(entry) else {
            continue;
        };
        if field.distances[i] == 0 {
            continue;
        }
        field.distances[i] = 0;
        field.origins[i] = Some(entry);
        queue.push_back(entry);
    }

    while let Some(cell) = queue.pop_front() {
        let Some(ci) = grid.index_of(cell) else {
            continue;
        };
        let next_distance = field.distances[ci] + 1;
        let origin = field.origins[ci];

        for (dx, dy) in NEIGHBOURS {
            let next = cell.offset(dx, dy);
            if !grid.is_walkable(next) {
                continue;
            }
            let Some(ni) = grid.index_of(next) else {
                continue;
            };
            if field.distances[ni] != UNREACHED {
                continue;
            }
            field.distances[ni] = next_distance;
            field.origins[ni] = origin;
            queue.push_back(next);
        }
    }

    field
}

/// Reachability of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    /// Target tile.
    pub target: TilePos,
    /// Whether an entry reaches it.
    pub reached: bool,
    /// Steps from the nearest entry.
    pub distance: Option<u32>,
    /// Entry that reached it.
    pub entry: Option<TilePos>,
}

/// A walkable pocket no entry reaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectedZone {
    /// First tile of the zone in row-major order.
    pub representative: TilePos,
    /// Number of tiles.
    pub size: usize,
}

/// Outcome of [`verify_traversal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalReport {
    /// Every target reached and no disconnected zone found.
    pub passed: bool,
    /// Per-target results, in input order.
    pub targets: Vec<TargetResult>,
    /// Walkable pockets unreachable from every entry.
    pub disconnected_zones: Vec<DisconnectedZone>,
}

impl TraversalReport {
    /// Targets no entry reaches.
    pub fn unreached(&self) -> impl Iterator<Item = &TargetResult> {
        self.targets.iter().filter(|t| !t.reached)
    }
}

/// Check that `entries` reach every target and that no walkable cell is
/// isolated from all entries.
#[must_use]
pub fn verify_traversal(
    grid: &CollisionGrid,
    entries: &[TilePos],
    targets: &[TilePos],
) -> TraversalReport {
    let field = bfs_flood_fill(grid, entries);

    let targets: Vec<TargetResult> = targets
        .iter()
        .map(|&target| TargetResult {
            target,
            reached: field.is_reached(target),
            distance: field.distance(target),
            entry: field.origin(target),
        })
        .collect();

    let disconnected_zones = find_disconnected_zones(grid, &field);
    let passed = targets.iter().all(|t| t.reached) && disconnected_zones.is_empty();

    if !passed {
        tracing::debug!(
            unreached = targets.iter().filter(|t| !t.reached).count(),
            zones = disconnected_zones.len(),
            "Traversal check failed"
        );
    }

    TraversalReport {
        passed,
        targets,
        disconnected_zones,
    }
}

/// Flood every walkable cell the first pass missed, in row-major order.
fn find_disconnected_zones(grid: &CollisionGrid, field: &DistanceField) -> Vec<DisconnectedZone> {
    let mut visited: Vec<bool> = field.distances.iter().map(|&d| d != UNREACHED).collect();
    let mut zones = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..grid.cells().len() {
        if visited[start] || !grid.cells()[start].is_walkable() {
            continue;
        }
        visited[start] = true;
        let representative = grid.pos_of(start);
        queue.push_back(representative);
        let mut size = 0;

        while let Some(cell) = queue.pop_front() {
            size += 1;
            for (dx, dy) in NEIGHBOURS {
                let next = cell.offset(dx, dy);
                let Some(ni) = grid.index_of(next) else {
                    continue;
                };
                if visited[ni] || !grid.cells()[ni].is_walkable() {
                    continue;
                }
                visited[ni] = true;
                queue.push_back(next);
            }
        }

        zones.push(DisconnectedZone {
            representative,
            size,
        });
    }

    zones
}
