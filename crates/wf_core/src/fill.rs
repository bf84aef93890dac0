//! Biome fill: ground, scatter objects and edge rings.
//!
//! Runs last in a region build. Fill only ever raises tiles to blocked; roads,
//! buildings and reserved areas placed earlier stay as they are.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::biome::{BiomeProfile, ScatterRule};
use crate::grid::{CollisionGrid, TileState};
use crate::math::{Rect, TilePos};
use crate::rng::SeededRng;

/// Share of a map side treated as the outer band by edge-biased rules.
const EDGE_BAND_FRACTION: f64 = 0.15;
/// Candidate draws per expected object before giving up.
const ATTEMPTS_PER_OBJECT: u32 = 10;

/// A decorative object on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterPlacement {
    /// Object label.
    pub object: String,
    /// Tile.
    pub position: TilePos,
    /// Whether the tile was raised to blocked.
    pub blocking: bool,
    /// Spacing this object demands from its neighbours.
    pub exclusion_radius: u32,
}

/// One tile of an edge ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePlacement {
    /// Edge object label.
    pub kind: String,
    /// Tile.
    pub position: TilePos,
    /// Ring index, 0 being the outermost.
    pub ring: u32,
}

/// A scatter rule that placed fewer objects than expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterShortfall {
    /// Object label.
    pub object: String,
    /// Expected count.
    pub expected: u32,
    /// Placed count.
    pub placed: u32,
}

/// Everything the fill phase produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResult {
    /// Ground label written under every open tile.
    pub ground_label: String,
    /// Row-major mask of tiles that received ground.
    pub ground: Vec<bool>,
    /// Scatter objects in placement order.
    pub scatter: Vec<ScatterPlacement>,
    /// Edge ring tiles, outermost ring first.
    pub edges: Vec<EdgePlacement>,
    /// Rules that ran out of attempts.
    pub shortfalls: Vec<ScatterShortfall>,
}

impl FillResult {
    /// Number of tiles that received ground.
    #[must_use]
    pub fn ground_count(&self) -> usize {
        self.ground.iter().filter(|&&g| g).count()
    }
}

/// Fill a composed grid with `biome`.
///
/// `connection_tiles` are gate tiles that neither blocking scatter nor the
/// edge rings may close.
pub fn fill_region(
    grid: &mut CollisionGrid,
    biome: &BiomeProfile,
    connection_tiles: &BTreeSet<TilePos>,
    rng: &mut SeededRng,
) -> FillResult {
    let ground = grid.cells().iter().map(|c| c.is_unoccupied()).collect();

    let mut scatter = Vec::new();
    let mut shortfalls = Vec::new();
    for rule in &biome.scatter {
        let before = scatter.len();
        let expected = scatter_rule(grid, rule, connection_tiles, rng, &mut scatter);
        let placed = (scatter.len() - before) as u32;
        if placed < expected {
            tracing::warn!(object = %rule.object, expected, placed, "Scatter shortfall");
            shortfalls.push(ScatterShortfall {
                object: rule.object.clone(),
                expected,
                placed,
            });
        }
    }

    let edges = fill_edges(grid, &biome.edge.kind, biome.edge.depth, connection_tiles);

    FillResult {
        ground_label: biome.base_ground.clone(),
        ground,
        scatter,
        edges,
        shortfalls,
    }
}

/// Place objects for one rule. Returns the expected count.
fn scatter_rule(
    grid: &mut CollisionGrid,
    rule: &ScatterRule,
    connection_tiles: &BTreeSet<TilePos>,
    rng: &mut SeededRng,
    placed: &mut Vec<ScatterPlacement>,
) -> u32 {
    let w = grid.width() as i32;
    let h = grid.height() as i32;
    let area = f64::from(grid.width()) * f64::from(grid.height());
    let expected = (rule.frequency * area / 100.0).round().max(0.0) as u32;
    let max_attempts = expected.saturating_mul(ATTEMPTS_PER_OBJECT);

    let band_x = ((f64::from(w) * EDGE_BAND_FRACTION) as i32).max(1);
    let band_y = ((f64::from(h) * EDGE_BAND_FRACTION) as i32).max(1);

    let mut count = 0;
    let mut attempts = 0;
    while count < expected && attempts < max_attempts {
        attempts += 1;

        let mut x = rng.range(0, w);
        let mut y = rng.range(0, h);
        if rule.edge_bias {
            match rng.range(0, 4) {
                0 => y = rng.range(0, band_y),
                1 => y = h - 1 - rng.range(0, band_y),
                2 => x = w - 1 - rng.range(0, band_x),
                _ => x = rng.range(0, band_x),
            }
        }
        let pos = TilePos::new(x, y);

        if grid.get(pos) != Some(TileState::Passable) || connection_tiles.contains(&pos) {
            continue;
        }
        let crowded = placed.iter().any(|other| {
            let spacing = rule.exclusion_radius.max(other.exclusion_radius);
            pos.manhattan(other.position) <= spacing
        });
        if crowded {
            continue;
        }

        if rule.blocking {
            grid.set(pos, TileState::Blocked);
        }
        placed.push(ScatterPlacement {
            object: rule.object.clone(),
            position: pos,
            blocking: rule.blocking,
            exclusion_radius: rule.exclusion_radius,
        });
        count += 1;
    }

    expected
}

/// Block `depth` concentric rings around the map border.
fn fill_edges(
    grid: &mut CollisionGrid,
    kind: &str,
    depth: u32,
    connection_tiles: &BTreeSet<TilePos>,
) -> Vec<EdgePlacement> {
    let mut edges = Vec::new();
    let bounds = grid.bounds();

    for ring in 0..depth {
        let outer = bounds.inflate(-(ring as i32));
        if outer.w <= 0 || outer.h <= 0 {
            break;
        }
        let inner = outer.inflate(-1);
        for p in outer.tiles() {
            if inner.contains(p) || connection_tiles.contains(&p) {
                continue;
            }
            if grid.get(p).is_some_and(TileState::is_unoccupied) {
                grid.set(p, TileState::Blocked);
                edges.push(EdgePlacement {
                    kind: kind.to_string(),
                    position: p,
                    ring,
                });
            }
        }
    }

    edges
}

/// Tiles within `depth` of the border.
#[must_use]
pub fn in_edge_band(bounds: &Rect, p: TilePos, depth: u32) -> bool {
    bounds.contains(p) && !bounds.inflate(-(depth as i32)).contains(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{BiomeRegistry, EdgeTreatment};

    fn bare_biome(depth: u32, scatter: Vec<ScatterRule>) -> BiomeProfile {
        BiomeProfile {
            id: "test".into(),
            base_ground: "dirt".into(),
            road_width: 3,
            edge: EdgeTreatment {
                kind: "wall".into(),
                depth,
            },
            scatter,
        }
    }

    fn rule(object: &str, frequency: f64, radius: u32, blocking: bool) -> ScatterRule {
        ScatterRule {
            object: object.into(),
            frequency,
            exclusion_radius: radius,
            edge_bias: false,
            blocking,
        }
    }

    #[test]
    fn test_edge_rings() {
        let mut grid = CollisionGrid::new(20, 20);
        let biome = bare_biome(2, Vec::new());
        let result = fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(1));
        assert_eq!(result.edges.len(), 20 * 20 - 16 * 16);
        assert_eq!(grid.count(TileState::Blocked), 144);
        assert_eq!(result.edges[0].ring, 0);
        assert_eq!(result.edges.last().unwrap().ring, 1);
    }

    #[test]
    fn test_connection_tiles_stay_open() {
        let mut grid = CollisionGrid::new(20, 20);
        let gates: BTreeSet<_> = [TilePos::new(10, 0), TilePos::new(10, 1)].into_iter().collect();
        fill_region(&mut grid, &bare_biome(2, Vec::new()), &gates, &mut SeededRng::new(1));
        assert_eq!(grid.get(TilePos::new(10, 0)), Some(TileState::Passable));
        assert_eq!(grid.get(TilePos::new(10, 1)), Some(TileState::Passable));
        assert_eq!(grid.get(TilePos::new(11, 0)), Some(TileState::Blocked));
    }

    #[test]
    fn test_edges_skip_roads() {
        let mut grid = CollisionGrid::new(20, 20);
        grid.set(TilePos::new(0, 5), TileState::Road);
        grid.set(TilePos::new(0, 6), TileState::Reserved);
        let biome = bare_biome(1, Vec::new());
        fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(1));
        assert_eq!(grid.get(TilePos::new(0, 5)), Some(TileState::Road));
        assert_eq!(grid.get(TilePos::new(0, 6)), Some(TileState::Blocked));
    }

    #[test]
    fn test_ground_covers_open_tiles() {
        let mut grid = CollisionGrid::new(10, 10);
        grid.mark_area(0, 0, 2, 2, TileState::Blocked);
        grid.mark_area(5, 5, 2, 2, TileState::Road);
        grid.mark_area(8, 8, 1, 1, TileState::Reserved);
        let biome = bare_biome(0, Vec::new());
        let result = fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(1));
        assert_eq!(result.ground_label, "dirt");
        assert_eq!(result.ground_count(), 100 - 4 - 4);
    }

    #[test]
    fn test_scatter_respects_spacing_and_blocks() {
        let mut grid = CollisionGrid::new(50, 50);
        let biome = bare_biome(
            0,
            vec![rule("tree", 4.0, 3, true), rule("flower", 4.0, 2, false)],
        );
        let result = fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(9));

        assert!(!result.scatter.is_empty());
        for (i, a) in result.scatter.iter().enumerate() {
            for b in &result.scatter[i + 1..] {
                let spacing = a.exclusion_radius.max(b.exclusion_radius);
                assert!(a.position.manhattan(b.position) > spacing);
            }
        }
        let trees = result.scatter.iter().filter(|s| s.blocking).count();
        assert_eq!(grid.count(TileState::Blocked), trees);
    }

    #[test]
    fn test_scatter_only_on_open_ground() {
        let mut grid = CollisionGrid::new(30, 30);
        grid.mark_area(0, 0, 30, 15, TileState::Road);
        let biome = bare_biome(0, vec![rule("rock", 2.0, 2, true)]);
        let result = fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(3));
        assert!(result.scatter.iter().all(|s| s.position.y >= 15));
    }

    #[test]
    fn test_shortfall_recorded() {
        let mut grid = CollisionGrid::new(20, 20);
        grid.mark_area(0, 0, 20, 20, TileState::Blocked);
        let biome = bare_biome(0, vec![rule("rock", 5.0, 2, true)]);
        let result = fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(3));
        assert_eq!(
            result.shortfalls,
            vec![ScatterShortfall {
                object: "rock".into(),
                expected: 20,
                placed: 0
            }]
        );
    }

    #[test]
    fn test_edge_bias_lands_in_band() {
        let mut grid = CollisionGrid::new(100, 100);
        let mut biased = rule("pine", 1.0, 2, false);
        biased.edge_bias = true;
        let biome = bare_biome(0, vec![biased]);
        let result = fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(4));
        assert!(!result.scatter.is_empty());
        for s in &result.scatter {
            assert!(in_edge_band(&grid.bounds(), s.position, 15));
        }
    }

    #[test]
    fn test_fill_deterministic() {
        let biome = BiomeRegistry::with_builtins().get("forest").unwrap().clone();
        let run = || {
            let mut grid = CollisionGrid::new(80, 80);
            let result = fill_region(&mut grid, &biome, &BTreeSet::new(), &mut SeededRng::new(77));
            (grid, result)
        };
        assert_eq!(run(), run());
    }
}
