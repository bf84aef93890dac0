//! Anchor declarations: towns, dungeon entrances and landmarks.

use serde::{Deserialize, Serialize};

use crate::math::{Size, TilePos};

/// A named point of interest inside a region.
///
/// # Example RON
///
/// ```ron
/// AnchorDefinition(
///     id: "millbrook",
///     name: "Millbrook",
///     kind: Town(TownDefinition(
///         size: Village,
///         services: [Service(kind: Inn, keeper: Some("innkeeper_rosa"))],
///         house_count: 4,
///     )),
///     position: Start,
///     world_slots: [WorldSlot(slot: "inn", instance: "millbrook_inn")],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorDefinition {
    /// Globally unique anchor id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// What kind of anchor this is, with its payload.
    pub kind: AnchorKind,
    /// Approximate position inside the region.
    #[serde(default)]
    pub position: PositionHint,
    /// NPCs that live at this anchor.
    #[serde(default)]
    pub npcs: Vec<String>,
    /// Event references.
    #[serde(default)]
    pub events: Vec<String>,
    /// Quest references.
    #[serde(default)]
    pub quests: Vec<String>,
    /// Doors into nested child worlds.
    #[serde(default)]
    pub world_slots: Vec<WorldSlot>,
}

impl AnchorDefinition {
    /// Child world instance ids in slot order.
    #[must_use]
    pub fn instance_ids(&self) -> Vec<String> {
        self.world_slots.iter().map(|s| s.instance.clone()).collect()
    }
}

/// Anchor kind. Payload-carrying kinds hold their definition directly, so a
/// town payload can only exist on a town anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnchorKind {
    /// A settlement with buildings and services.
    Town(TownDefinition),
    /// A dungeon entrance.
    Dungeon(DungeonDefinition),
    /// A roadside shrine.
    Shrine,
    /// A fortified structure.
    Fortress,
    /// A camp.
    Camp,
    /// A generic landmark.
    Landmark,
    /// A gate structure.
    Gate,
}

/// Payload-free tag of an [`AnchorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorTag {
    /// Town.
    Town,
    /// Dungeon entrance.
    Dungeon,
    /// Shrine.
    Shrine,
    /// Fortress.
    Fortress,
    /// Camp.
    Camp,
    /// Landmark.
    Landmark,
    /// Gate.
    Gate,
}

impl AnchorKind {
    /// The kind's tag.
    #[must_use]
    pub const fn tag(&self) -> AnchorTag {
        match self {
            Self::Town(_) => AnchorTag::Town,
            Self::Dungeon(_) => AnchorTag::Dungeon,
            Self::Shrine => AnchorTag::Shrine,
            Self::Fortress => AnchorTag::Fortress,
            Self::Camp => AnchorTag::Camp,
            Self::Landmark => AnchorTag::Landmark,
            Self::Gate => AnchorTag::Gate,
        }
    }

    /// Side length of the square box reserved for this anchor in a region.
    #[must_use]
    pub fn box_side(&self) -> i32 {
        match self {
            Self::Town(town) => town.size.box_side(),
            _ => 15,
        }
    }
}

/// Where in the region an anchor should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionHint {
    /// Near the region's start.
    Start,
    /// Around the middle.
    #[default]
    Middle,
    /// Near the end.
    End,
    /// Off to the side.
    Side,
    /// Exact tile coordinates of the anchor center.
    At {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
}

impl PositionHint {
    /// Sort key for hinted anchors; explicit positions have none.
    #[must_use]
    pub const fn priority(&self) -> Option<u8> {
        match self {
            Self::Start => Some(0),
            Self::Middle => Some(1),
            Self::End => Some(2),
            Self::Side => Some(3),
            Self::At { .. } => None,
        }
    }

    /// Explicit coordinates, if any.
    #[must_use]
    pub const fn explicit(&self) -> Option<TilePos> {
        match self {
            Self::At { x, y } => Some(TilePos::new(*x, *y)),
            _ => None,
        }
    }
}

/// A door into a nested child world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSlot {
    /// Slot name within the anchor.
    pub slot: String,
    /// Child world instance id.
    pub instance: String,
}

/// Town size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TownSize {
    /// A handful of houses around a well.
    Hamlet,
    /// Small town.
    #[default]
    Village,
    /// Town.
    Town,
    /// City.
    City,
}

impl TownSize {
    /// Side length of the square box reserved for a town of this size.
    #[must_use]
    pub const fn box_side(self) -> i32 {
        match self {
            Self::Hamlet => 30,
            Self::Village => 40,
            Self::Town => 45,
            Self::City => 60,
        }
    }
}

/// Town payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TownDefinition {
    /// Size class.
    #[serde(default)]
    pub size: TownSize,
    /// Service buildings, placed before houses.
    #[serde(default)]
    pub services: Vec<Service>,
    /// Number of plain houses.
    #[serde(default)]
    pub house_count: u32,
    /// Label of the central feature (well, fountain, statue...).
    #[serde(default)]
    pub central_feature: Option<String>,
}

/// A service building in a town.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service type.
    pub kind: ServiceType,
    /// Keeper NPC id.
    #[serde(default)]
    pub keeper: Option<String>,
}

/// Service building types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Inn.
    Inn,
    /// General store.
    GeneralStore,
    /// Blacksmith.
    Blacksmith,
    /// Temple.
    Temple,
    /// Alchemist.
    Alchemist,
    /// Stable.
    Stable,
    /// Guild hall.
    Guild,
    /// Market hall.
    Market,
}

impl ServiceType {
    /// Building footprint for this service.
    #[must_use]
    pub const fn footprint(self) -> Size {
        match self {
            Self::Inn => Size::new(7, 5),
            Self::GeneralStore => Size::new(5, 4),
            Self::Blacksmith => Size::new(5, 4),
            Self::Temple => Size::new(6, 6),
            Self::Alchemist => Size::new(4, 4),
            Self::Stable => Size::new(6, 4),
            Self::Guild => Size::new(6, 5),
            Self::Market => Size::new(7, 6),
        }
    }

    /// Lowercase identifier used for archetype lookups.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Inn => "inn",
            Self::GeneralStore => "general_store",
            Self::Blacksmith => "blacksmith",
            Self::Temple => "temple",
            Self::Alchemist => "alchemist",
            Self::Stable => "stable",
            Self::Guild => "guild",
            Self::Market => "market",
        }
    }
}

/// Dungeon entrance payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DungeonDefinition {
    /// Number of floors below the entrance.
    #[serde(default = "default_floors")]
    pub floors: u32,
    /// Boss NPC id.
    #[serde(default)]
    pub boss: Option<String>,
}

const fn default_floors() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_priority_order() {
        let mut hints = [
            PositionHint::Side,
            PositionHint::End,
            PositionHint::Start,
            PositionHint::Middle,
        ];
        hints.sort_by_key(|h| h.priority());
        assert_eq!(
            hints,
            [
                PositionHint::Start,
                PositionHint::Middle,
                PositionHint::End,
                PositionHint::Side
            ]
        );
        assert_eq!(PositionHint::At { x: 1, y: 2 }.priority(), None);
    }

    #[test]
    fn test_kind_tag_and_box() {
        let town = AnchorKind::Town(TownDefinition {
            size: TownSize::City,
            ..Default::default()
        });
        assert_eq!(town.tag(), AnchorTag::Town);
        assert_eq!(town.box_side(), 60);
        assert_eq!(AnchorKind::Shrine.box_side(), 15);
    }

    #[test]
    fn test_parse_anchor_ron() {
        let ron = r#"AnchorDefinition(
            id: "millbrook",
            name: "Millbrook",
            kind: Town(TownDefinition(
                size: Village,
                services: [Service(kind: Inn, keeper: Some("rosa"))],
                house_count: 4,
            )),
            position: At(x: 30, y: 40),
            world_slots: [WorldSlot(slot: "inn", instance: "millbrook_inn")],
        )"#;
        let anchor: AnchorDefinition = ron::from_str(ron).unwrap();
        assert_eq!(anchor.id, "millbrook");
        assert_eq!(anchor.position.explicit(), Some(TilePos::new(30, 40)));
        assert_eq!(anchor.instance_ids(), vec!["millbrook_inn".to_string()]);
        match anchor.kind {
            AnchorKind::Town(town) => {
                assert_eq!(town.services.len(), 1);
                assert_eq!(town.house_count, 4);
            }
            other => panic!("expected town, got {other:?}"),
        }
    }
}
