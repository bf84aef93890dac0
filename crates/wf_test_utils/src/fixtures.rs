//! Test fixtures and helpers.
//!
//! Declarations shared by unit tests, integration tests and benchmarks. The
//! region and world fixtures are deliberately sparse: few anchors in a map
//! large enough that no anchor box has to be moved or shrunk.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use wf_core::archetype::ArchetypeRegistry;
use wf_core::data::{
    AnchorDefinition, AnchorKind, Compass, ConnectionType, ConnectiveTissue, DungeonDefinition,
    InstanceKind, PositionHint, RegionConnection, RegionDefinition, Service, ServiceType,
    StartPoint, TownDefinition, TownSize, WildFeatureRule, WildPlacement, WorldDefinition,
    WorldInstanceDefinition, WorldSlot, WorldTemplate,
};
use wf_core::math::{Rect, TilePos};
use wf_core::organism::{layout_hamlet, layout_town, HamletConfig, HamletLayout, TownLayout};
use wf_core::world::WorldBundle;

/// Seed used by every layout fixture.
pub const FIXTURE_SEED: u64 = 42;

/// `n` instance ids: `interior_0`, `interior_1`...
#[must_use]
pub fn instance_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("interior_{i}")).collect()
}

/// An anchor with no payload, NPCs or slots.
#[must_use]
pub fn anchor(id: &str, kind: AnchorKind, position: PositionHint) -> AnchorDefinition {
    AnchorDefinition {
        id: id.into(),
        name: id.into(),
        kind,
        position,
        npcs: Vec::new(),
        events: Vec::new(),
        quests: Vec::new(),
        world_slots: Vec::new(),
    }
}

/// Town with an inn, a general store, a blacksmith and a temple plus three
/// houses.
#[must_use]
pub fn town_definition() -> TownDefinition {
    TownDefinition {
        size: TownSize::Town,
        services: [
            ServiceType::Inn,
            ServiceType::GeneralStore,
            ServiceType::Blacksmith,
            ServiceType::Temple,
        ]
        .into_iter()
        .map(|kind| Service { kind, keeper: None })
        .collect(),
        house_count: 3,
        central_feature: None,
    }
}

/// The town fixture laid out in a 45x45 box with four child worlds.
#[must_use]
pub fn town_layout() -> TownLayout {
    layout_town(
        Rect::new(0, 0, 45, 45),
        &town_definition(),
        &instance_ids(4),
        FIXTURE_SEED,
        &ArchetypeRegistry::new(),
    )
}

/// Three-house hamlet with a well in a 30x30 box.
#[must_use]
pub fn hamlet_layout() -> HamletLayout {
    layout_hamlet(
        Rect::new(0, 0, 30, 30),
        &HamletConfig::default(),
        FIXTURE_SEED,
        &ArchetypeRegistry::new(),
    )
}

fn slot(slot: &str, instance: &str) -> WorldSlot {
    WorldSlot {
        slot: slot.into(),
        instance: instance.into(),
    }
}

/// Meadow region: a village with an inn, a barrow dungeon and a shrine.
#[must_use]
pub fn meadow_region() -> RegionDefinition {
    let mut village = anchor(
        "millbrook",
        AnchorKind::Town(TownDefinition {
            size: TownSize::Village,
            services: vec![
                Service {
                    kind: ServiceType::Inn,
                    keeper: Some("martha".into()),
                },
                Service {
                    kind: ServiceType::GeneralStore,
                    keeper: None,
                },
            ],
            house_count: 3,
            central_feature: Some("well".into()),
        }),
        PositionHint::Start,
    );
    village.npcs = vec!["martha".into(), "old_tom".into()];
    village.world_slots = vec![slot("inn", "millbrook_inn")];

    let mut barrow = anchor(
        "barrow",
        AnchorKind::Dungeon(DungeonDefinition {
            floors: 2,
            boss: Some("wight".into()),
        }),
        PositionHint::Middle,
    );
    barrow.world_slots = vec![slot("entrance", "barrow_depths")];

    RegionDefinition {
        id: "meadow".into(),
        biome: "plains".into(),
        time_budget_minutes: 15,
        difficulty: 1,
        anchors: vec![
            village,
            barrow,
            anchor("stones", AnchorKind::Shrine, PositionHint::End),
        ],
        tissue: ConnectiveTissue {
            path_density: 0.5,
            safe_zone_interval_minutes: None,
            wild_features: vec![
                WildFeatureRule {
                    kind: "campfire".into(),
                    placement: WildPlacement::NearPath,
                    count: 2,
                },
                WildFeatureRule {
                    kind: "hidden_chest".into(),
                    placement: WildPlacement::Hidden,
                    count: 1,
                },
            ],
        },
    }
}

/// Woods region: a hamlet and a camp under forest cover.
#[must_use]
pub fn woods_region() -> RegionDefinition {
    RegionDefinition {
        id: "woods".into(),
        biome: "forest".into(),
        time_budget_minutes: 10,
        difficulty: 2,
        anchors: vec![
            anchor(
                "thornby",
                AnchorKind::Town(TownDefinition {
                    size: TownSize::Hamlet,
                    house_count: 3,
                    ..TownDefinition::default()
                }),
                PositionHint::Start,
            ),
            anchor("hunters_camp", AnchorKind::Camp, PositionHint::End),
        ],
        tissue: ConnectiveTissue::default(),
    }
}

/// Two regions joined by a road, starting at Millbrook.
#[must_use]
pub fn world_definition() -> WorldDefinition {
    WorldDefinition {
        name: "vale".into(),
        seed: FIXTURE_SEED,
        start: StartPoint {
            region: "meadow".into(),
            anchor: "millbrook".into(),
        },
        regions: vec![meadow_region(), woods_region()],
        connections: vec![RegionConnection {
            from: "meadow".into(),
            to: "woods".into(),
            kind: ConnectionType::Road,
            unlock: None,
            direction: Compass::East,
        }],
    }
}

/// The world fixture with its child worlds and the built-in biomes.
#[must_use]
pub fn world_bundle() -> WorldBundle {
    let mut bundle = WorldBundle::new(world_definition());
    // Sorted by id, the order the loader reads them back in.
    bundle.templates = vec![
        WorldTemplate {
            id: "crypt".into(),
            kind: InstanceKind::Dungeon,
            width: 40,
            height: 40,
            entry: TilePos::new(20, 39),
        },
        WorldTemplate {
            id: "inn_interior".into(),
            kind: InstanceKind::Shop,
            width: 16,
            height: 12,
            entry: TilePos::new(8, 11),
        },
    ];
    bundle.instances = vec![
        WorldInstanceDefinition {
            id: "barrow_depths".into(),
            template: "crypt".into(),
            name: "Barrow Depths".into(),
        },
        WorldInstanceDefinition {
            id: "millbrook_inn".into(),
            template: "inn_interior".into(),
            name: "The Brook Inn".into(),
        },
    ];
    bundle
}

fn write_ron<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)
}

/// Write [`world_bundle`] as a data root: `world.ron` plus one file per
/// template and instance.
///
/// # Errors
///
/// Returns any IO or RON encoding error.
pub fn write_world_root(root: &Path) -> io::Result<()> {
    let bundle = world_bundle();
    write_ron(&root.join("world.ron"), &bundle.world)?;
    for template in &bundle.templates {
        write_ron(&root.join("templates").join(format!("{}.ron", template.id)), template)?;
    }
    for instance in &bundle.instances {
        write_ron(&root.join("instances").join(format!("{}.ron", instance.id)), instance)?;
    }
    tracing::debug!(root = %root.display(), "Wrote fixture world root");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_fixture_is_well_formed() {
        assert!(world_bundle().check().is_ok());
    }

    #[test]
    fn test_instance_ids() {
        assert_eq!(instance_ids(2), vec!["interior_0", "interior_1"]);
    }
}
