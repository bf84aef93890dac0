//! Landmark layout: one fixed structure in the middle of its box.

use serde::{Deserialize, Serialize};

use super::{BuildingKind, DoorTransition, PlacedBuilding, PlacementOutcome};
use crate::archetype::{resolve_or_placeholder, ArchetypeSource};
use crate::data::AnchorTag;
use crate::math::{Rect, Size, TilePos};

/// Side of the landmark footprint.
pub const LANDMARK_SIZE: i32 = 5;
/// Distance from the center to each entry anchor.
pub const LANDMARK_ENTRY_DISTANCE: i32 = 5;

/// Result of [`layout_landmark`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkLayout {
    /// Bounding box.
    pub bounds: Rect,
    /// The structure.
    pub structure: PlacedBuilding,
    /// Cardinal entries in N, S, E, W order.
    pub entry_anchors: Vec<TilePos>,
    /// Door into the first world slot, if any.
    pub door_transitions: Vec<DoorTransition>,
    /// Archetype ids that fell back to placeholders.
    pub archetype_fallbacks: Vec<String>,
}

/// Lay out a landmark of kind `tag`. Dungeons always get a door; other kinds
/// only when they have a child world.
pub fn layout_landmark(
    bounds: Rect,
    tag: AnchorTag,
    instance_ids: &[String],
    archetypes: &dyn ArchetypeSource,
) -> LandmarkLayout {
    let center = bounds.center();
    let footprint = Rect::centered(center, Size::new(LANDMARK_SIZE, LANDMARK_SIZE));
    let kind = BuildingKind::Structure(tag_label(tag).to_string());

    let mut archetype_fallbacks = Vec::new();
    let archetype =
        resolve_or_placeholder(archetypes, &kind.archetype_id(), &mut archetype_fallbacks);

    let has_door = tag == AnchorTag::Dungeon || !instance_ids.is_empty();
    let door = has_door.then(|| footprint.bottom_center());
    let door_transitions = door
        .zip(instance_ids.first())
        .map(|(door, instance)| DoorTransition {
            door,
            instance: instance.clone(),
            building: kind.archetype_id(),
        })
        .into_iter()
        .collect();

    let d = LANDMARK_ENTRY_DISTANCE;
    let entry_anchors = vec![
        center.offset(0, -d),
        center.offset(0, d),
        center.offset(d, 0),
        center.offset(-d, 0),
    ];

    LandmarkLayout {
        bounds,
        structure: PlacedBuilding {
            kind,
            footprint,
            door,
            outcome: PlacementOutcome::Placed { attempts: 1 },
            archetype,
        },
        entry_anchors,
        door_transitions,
        archetype_fallbacks,
    }
}

fn tag_label(tag: AnchorTag) -> &'static str {
    match tag {
        AnchorTag::Town => "town",
        AnchorTag::Dungeon => "dungeon",
        AnchorTag::Shrine => "shrine",
        AnchorTag::Fortress => "fortress",
        AnchorTag::Camp => "camp",
        AnchorTag::Landmark => "landmark",
        AnchorTag::Gate => "gate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeRegistry;

    #[test]
    fn test_shrine_has_no_door() {
        let registry = ArchetypeRegistry::new();
        let layout = layout_landmark(Rect::new(10, 10, 15, 15), AnchorTag::Shrine, &[], &registry);
        assert_eq!(layout.structure.footprint, Rect::new(15, 15, 5, 5));
        assert!(layout.structure.door.is_none());
        assert!(layout.door_transitions.is_empty());
        assert_eq!(layout.archetype_fallbacks, vec!["structure:shrine".to_string()]);
    }

    #[test]
    fn test_entries_outside_footprint() {
        let registry = ArchetypeRegistry::new();
        let layout = layout_landmark(Rect::new(0, 0, 15, 15), AnchorTag::Camp, &[], &registry);
        assert_eq!(layout.entry_anchors[0], TilePos::new(7, 2));
        for entry in &layout.entry_anchors {
            assert!(!layout.structure.footprint.inflate(1).contains(*entry));
            assert!(layout.bounds.contains(*entry));
        }
    }

    #[test]
    fn test_dungeon_door_maps_first_slot() {
        let ids = vec!["crypt_1".to_string(), "crypt_2".to_string()];
        let registry = ArchetypeRegistry::new();
        let layout = layout_landmark(Rect::new(0, 0, 15, 15), AnchorTag::Dungeon, &ids, &registry);
        let door = layout.structure.door.unwrap();
        assert_eq!(door, TilePos::new(7, 10));
        assert_eq!(layout.door_transitions.len(), 1);
        assert_eq!(layout.door_transitions[0].instance, "crypt_1");

        let bare = layout_landmark(Rect::new(0, 0, 15, 15), AnchorTag::Dungeon, &[], &registry);
        assert!(bare.structure.door.is_some());
        assert!(bare.door_transitions.is_empty());
    }
}
