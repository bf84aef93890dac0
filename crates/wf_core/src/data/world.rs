//! World declarations: regions and the connections between them.

use serde::{Deserialize, Serialize};

use super::region::RegionDefinition;

/// Root of the declarative world graph.
///
/// # Example RON
///
/// ```ron
/// WorldDefinition(
///     name: "Vale",
///     seed: 42,
///     start: StartPoint(region: "meadow", anchor: "millbrook"),
///     regions: [...],
///     connections: [
///         RegionConnection(from: "meadow", to: "woods", kind: Road, direction: East),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDefinition {
    /// World name.
    pub name: String,
    /// Default seed when the caller does not supply one.
    #[serde(default)]
    pub seed: u64,
    /// Where the player starts.
    pub start: StartPoint,
    /// Regions in declaration order.
    pub regions: Vec<RegionDefinition>,
    /// Logical edges between regions.
    #[serde(default)]
    pub connections: Vec<RegionConnection>,
}

impl WorldDefinition {
    /// Look up a region by id.
    #[must_use]
    pub fn region(&self, id: &str) -> Option<&RegionDefinition> {
        self.regions.iter().find(|r| r.id == id)
    }
}

/// Start region and anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPoint {
    /// Start region id.
    pub region: String,
    /// Start anchor id inside that region.
    pub anchor: String,
}

/// A logical connection between two regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConnection {
    /// Source region id.
    pub from: String,
    /// Target region id.
    pub to: String,
    /// Connection type.
    #[serde(default)]
    pub kind: ConnectionType,
    /// Condition that unlocks the connection.
    #[serde(default)]
    pub unlock: Option<String>,
    /// Side of the source region the exit is on.
    pub direction: Compass,
}

/// How two regions are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    /// An open road.
    #[default]
    Road,
    /// A narrow trail.
    Trail,
    /// A bridge.
    Bridge,
    /// A gated pass.
    Gate,
    /// A cave passage.
    Cave,
}

/// Compass direction of a region exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Compass {
    /// Top edge.
    North,
    /// Right edge.
    East,
    /// Bottom edge.
    South,
    /// Left edge.
    West,
}

impl Compass {
    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}
