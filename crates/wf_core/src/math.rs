//! Tile-space geometry and fixed-point cost math.
//!
//! All positions are integer tile coordinates. Path costs use fixed-point
//! arithmetic so that A* ordering is exact and identical on every platform;
//! floating point only appears in the organism layouts' polar placement, where
//! the result is immediately rounded back onto the tile grid.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for path costs.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// A tile coordinate. Signed so that offsets outside the grid can be
/// represented and rejected by bounds checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row (grows downwards).
    pub y: i32,
}

impl TilePos {
    /// Create a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another tile.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Offset by a delta.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for TilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a footprint in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in tiles.
    pub w: i32,
    /// Height in tiles.
    pub h: i32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }

    /// The larger of the two dimensions.
    #[must_use]
    pub const fn max_side(self) -> i32 {
        if self.w > self.h {
            self.w
        } else {
            self.h
        }
    }
}

/// An axis-aligned rectangle of tiles. `x`/`y` is the top-left tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in tiles.
    pub w: i32,
    /// Height in tiles.
    pub h: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle with the given size whose top-left corner is `origin`.
    #[must_use]
    pub const fn at(origin: TilePos, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.w, size.h)
    }

    /// Rectangle of the given size centred on `center`.
    #[must_use]
    pub const fn centered(center: TilePos, size: Size) -> Self {
        Self::new(center.x - size.w / 2, center.y - size.h / 2, size.w, size.h)
    }

    /// Top-left tile.
    #[must_use]
    pub const fn origin(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }

    /// Footprint size.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Center tile (rounded towards the top-left).
    #[must_use]
    pub const fn center(&self) -> TilePos {
        TilePos::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// The tile directly below the bottom edge, horizontally centred.
    #[must_use]
    pub const fn bottom_center(&self) -> TilePos {
        TilePos::new(self.x + self.w / 2, self.y + self.h)
    }

    /// Whether the tile lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, p: TilePos) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether `other` lies entirely inside this rectangle.
    #[must_use]
    pub const fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grow the rectangle by `amount` tiles on every side.
    #[must_use]
    pub const fn inflate(&self, amount: i32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.w + amount * 2,
            self.h + amount * 2,
        )
    }

    /// Axis-aligned overlap test.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Move the rectangle so it lies inside `outer` (when it fits).
    #[must_use]
    pub fn clamped_into(&self, outer: &Self) -> Self {
        let max_x = (outer.right() - self.w).max(outer.x);
        let max_y = (outer.bottom() - self.h).max(outer.y);
        Self::new(
            self.x.clamp(outer.x, max_x),
            self.y.clamp(outer.y, max_y),
            self.w,
            self.h,
        )
    }

    /// Iterate every tile inside the rectangle in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> {
        let Rect { x, y, w, h } = *self;
        (y..y + h).flat_map(move |ty| (x..x + w).map(move |tx| TilePos::new(tx, ty)))
    }
}

/// Convert a polar offset around `center` to the nearest tile.
#[must_use]
pub fn polar_to_tile(center: TilePos, angle: f64, radius: f64) -> TilePos {
    TilePos::new(
        center.x + (angle.cos() * radius).round() as i32,
        center.y + (angle.sin() * radius).round() as i32,
    )
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}
