//! The collision grid shared by every composition phase.
//!
//! Each cell holds one of four occupancy states. Within one composition run
//! the grid only accumulates occupancy: there is no operation that frees a
//! cell again.

use serde::{Deserialize, Serialize};

use crate::math::{Rect, TilePos};

/// Occupancy state of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileState {
    /// Open ground.
    #[default]
    Passable = 0,
    /// Impassable (building, wall, blocking scatter object, edge).
    Blocked = 1,
    /// Road surface; cheapest to route over.
    Road = 2,
    /// Clearance around structures; walkable, but routes avoid it.
    Reserved = 3,
}

impl TileState {
    /// Raw numeric value as written to downstream collision layers.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true unless the tile is blocked.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Blocked)
    }

    /// Returns true for tiles the fill phase may still write into.
    #[must_use]
    pub const fn is_unoccupied(self) -> bool {
        matches!(self, Self::Passable | Self::Reserved)
    }
}

/// Flat row-major grid of [`TileState`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    cells: Vec<TileState>,
}

impl CollisionGrid {
    /// Create a new grid with every cell passable.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "CollisionGrid width must be positive");
        assert!(height > 0, "CollisionGrid height must be positive");

        Self {
            width,
            height,
            cells: vec![TileState::Passable; (width as usize) * (height as usize)],
        }
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The whole grid as a rectangle.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Raw cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[TileState] {
        &self.cells
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, p: TilePos) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }

    /// Row-major index of an in-bounds tile.
    #[must_use]
    pub fn index_of(&self, p: TilePos) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.y as usize) * (self.width as usize) + (p.x as usize))
    }

    /// Tile at a row-major index.
    #[must_use]
    pub const fn pos_of(&self, index: usize) -> TilePos {
        TilePos::new(
            (index % self.width as usize) as i32,
            (index / self.width as usize) as i32,
        )
    }

    /// State at coordinates, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, p: TilePos) -> Option<TileState> {
        self.index_of(p).map(|i| self.cells[i])
    }

    /// Returns true if the tile exists and is not blocked.
    #[must_use]
    pub fn is_walkable(&self, p: TilePos) -> bool {
        self.get(p).is_some_and(TileState::is_walkable)
    }

    /// Whether a road of `road_width` can be centred on `p`.
    ///
    /// The point is inflated by `road_width / 2` tiles in every direction; the
    /// check fails if any covered tile is blocked or outside the grid.
    #[must_use]
    pub fn is_passable_for_width(&self, p: TilePos, road_width: u32) -> bool {
        let half = (road_width / 2) as i32;
        for dy in -half..=half {
            for dx in -half..=half {
                if !self.is_walkable(p.offset(dx, dy)) {
                    return false;
                }
            }
        }
        true
    }

    /// Overwrite a single tile. Out-of-bounds writes are ignored.
    pub fn set(&mut self, p: TilePos, state: TileState) -> bool {
        if let Some(i) = self.index_of(p) {
            self.cells[i] = state;
            true
        } else {
            false
        }
    }

    /// Unconditionally overwrite a rectangle (clipped to the grid).
    pub fn mark_area(&mut self, x: i32, y: i32, w: i32, h: i32, state: TileState) {
        for p in Rect::new(x, y, w, h).tiles() {
            self.set(p, state);
        }
    }

    /// Raise passable tiles in a ring of `radius` around (not inside) the
    /// rectangle to [`TileState::Reserved`]. Blocked, road and already
    /// reserved tiles are left untouched.
    pub fn mark_clearance(&mut self, x: i32, y: i32, w: i32, h: i32, radius: u32) {
        let inner = Rect::new(x, y, w, h);
        let outer = inner.inflate(radius as i32);
        for p in outer.tiles() {
            if inner.contains(p) {
                continue;
            }
            if self.get(p) == Some(TileState::Passable) {
                self.set(p, TileState::Reserved);
            }
        }
    }

    /// Raise every non-blocked tile covered by a road of `road_width`
    /// centred on `p` to [`TileState::Road`].
    pub fn stamp_road(&mut self, p: TilePos, road_width: u32) {
        let half = (road_width / 2) as i32;
        for dy in -half..=half {
            for dx in -half..=half {
                let q = p.offset(dx, dy);
                if self.get(q).is_some_and(TileState::is_walkable) {
                    self.set(q, TileState::Road);
                }
            }
        }
    }

    /// Whether every tile of the rectangle is in bounds and passable.
    #[must_use]
    pub fn is_area_clear(&self, area: &Rect) -> bool {
        area.tiles()
            .all(|p| self.get(p) == Some(TileState::Passable))
    }

    /// Number of tiles currently in `state`.
    #[must_use]
    pub fn count(&self, state: TileState) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    /// Raw numeric cells, as consumed by tile-map serializers.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.as_u8()).collect()
    }
}
