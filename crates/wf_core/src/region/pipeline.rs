//! Phase-ordered region build.
//!
//! Each phase is a method that consumes a `RegionBuild` in one state and
//! returns it in the next, so phases cannot be skipped or reordered. The
//! collision grid moves through the pipeline by value.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

use crate::fill::fill_region;
use crate::grid::{CollisionGrid, TileState};
use crate::math::TilePos;
use crate::rng::SeededRng;
use crate::router::{route_all, RoutingResult};

use super::features::{
    place_safe_zones, place_wild_features, SafeZone, WildFeature, WildShortfall, TILES_PER_MINUTE,
};
use super::placement::{
    anchor_boxes, anchor_interior, default_npc_position, lay_out_anchor, nudge_entry,
    positioning_order, PlacedAnchor,
};
use super::roads::plan_requests;
use super::sizing::{gate_tiles, plan_exits, region_side, RegionExit};
use super::{ComposedRegion, Degradation, RegionDoor, RegionInputs};

/// Grid allocated and exits planned.
#[derive(Debug)]
pub struct Framed;
/// Anchor layouts stamped into the grid.
#[derive(Debug)]
pub struct AnchorsPlaced;
/// Entry anchors moved onto road-passable tiles.
#[derive(Debug)]
pub struct EntriesSettled;
/// Roads carved.
#[derive(Debug)]
pub struct Routed;
/// Wild features placed.
#[derive(Debug)]
pub struct Featured;
/// Safe zones reserved. Only the fill remains.
#[derive(Debug)]
pub struct Sheltered;

/// Mutable state carried from phase to phase.
#[derive(Debug)]
struct Work {
    rng: SeededRng,
    grid: CollisionGrid,
    road_width: u32,
    edge_depth: u32,
    exits: Vec<RegionExit>,
    gates: BTreeSet<TilePos>,
    anchors: Vec<PlacedAnchor>,
    chain_order: Vec<usize>,
    routing: RoutingResult,
    wild_features: Vec<WildFeature>,
    wild_shortfalls: Vec<WildShortfall>,
    safe_zones: Vec<SafeZone>,
    door_transitions: Vec<RegionDoor>,
    npc_positions: BTreeMap<String, TilePos>,
    degradations: Vec<Degradation>,
}

/// A region build in state `S`.
#[derive(Debug)]
pub struct RegionBuild<'a, S> {
    inputs: &'a RegionInputs<'a>,
    work: Work,
    _state: PhantomData<S>,
}

impl<'a, S> RegionBuild<'a, S> {
    fn advance<T>(self) -> RegionBuild<'a, T> {
        RegionBuild {
            inputs: self.inputs,
            work: self.work,
            _state: PhantomData,
        }
    }

    /// The grid as it stands after the phases run so far.
    #[must_use]
    pub fn grid(&self) -> &CollisionGrid {
        &self.work.grid
    }

    /// Anchors placed so far, in declaration order.
    #[must_use]
    pub fn anchors(&self) -> &[PlacedAnchor] {
        &self.work.anchors
    }
}

impl<'a> RegionBuild<'a, Framed> {
    /// Size the map, seed the RNG and plan the exits.
    #[must_use]
    pub fn new(inputs: &'a RegionInputs<'a>) -> Self {
        let side = region_side(inputs.definition.time_budget_minutes);
        let grid = CollisionGrid::new(side, side);
        let road_width = inputs.biome.road_width;
        let edge_depth = inputs.biome.edge.depth;
        let exits = plan_exits(side, inputs.exits, road_width);
        let gates = gate_tiles(&grid.bounds(), &exits, edge_depth, road_width);

        tracing::debug!(
            region = %inputs.definition.id,
            side,
            exits = exits.len(),
            seed = inputs.seed,
            "Region sized"
        );

        Self {
            inputs,
            work: Work {
                rng: SeededRng::new(inputs.seed),
                grid,
                road_width,
                edge_depth,
                exits,
                gates,
                anchors: Vec::new(),
                chain_order: Vec::new(),
                routing: RoutingResult::default(),
                wild_features: Vec::new(),
                wild_shortfalls: Vec::new(),
                safe_zones: Vec::new(),
                door_transitions: Vec::new(),
                npc_positions: BTreeMap::new(),
                degradations: Vec::new(),
            },
            _state: PhantomData,
        }
    }

    /// Position every anchor, lay out its organism and stamp it.
    #[must_use]
    pub fn place_anchors(mut self) -> RegionBuild<'a, AnchorsPlaced> {
        let definition = self.inputs.definition;
        let work = &mut self.work;
        let interior = anchor_interior(work.grid.width(), work.edge_depth);
        let boxes = anchor_boxes(&definition.anchors, interior, &mut work.rng);

        for (anchor, placed) in definition.anchors.iter().zip(&boxes) {
            let bounds = placed.bounds;
            if placed.overlapping {
                tracing::warn!(anchor = %anchor.id, bounds = ?bounds, "Anchor box overlaps");
                work.degradations.push(Degradation::AnchorOverlap {
                    anchor: anchor.id.clone(),
                    bounds,
                });
            } else if placed.is_adjusted() {
                tracing::warn!(
                    anchor = %anchor.id,
                    requested = ?placed.requested,
                    placed = ?bounds,
                    "Anchor box moved"
                );
                work.degradations.push(Degradation::AnchorMoved {
                    anchor: anchor.id.clone(),
                    requested: placed.requested,
                    placed: bounds,
                });
            }

            let seed = work.rng.derive_seed();
            let layout = lay_out_anchor(anchor, bounds, seed, self.inputs.archetypes);
            layout.stamp(&mut work.grid);

            for building in layout.buildings() {
                if building.outcome.is_degraded() {
                    tracing::warn!(
                        anchor = %anchor.id,
                        building = %building.kind.archetype_id(),
                        outcome = ?building.outcome,
                        "Degraded building placement"
                    );
                    work.degradations.push(Degradation::BuildingPlacement {
                        anchor: anchor.id.clone(),
                        building: building.kind.archetype_id(),
                        outcome: building.outcome,
                    });
                }
            }
            for archetype in layout.archetype_fallbacks() {
                work.degradations.push(Degradation::ArchetypeFallback {
                    anchor: anchor.id.clone(),
                    archetype: archetype.clone(),
                });
            }
            for transition in layout.door_transitions() {
                work.door_transitions.push(RegionDoor {
                    anchor: anchor.id.clone(),
                    door: transition.door,
                    instance: transition.instance.clone(),
                    building: transition.building.clone(),
                });
            }
            for npc in layout.npc_positions() {
                work.npc_positions.insert(npc.npc.clone(), npc.position);
            }

            work.anchors.push(PlacedAnchor {
                id: anchor.id.clone(),
                tag: anchor.kind.tag(),
                bounds,
                entries: layout.entry_anchors(),
                layout,
            });
        }

        // Defaults go in after every footprint is stamped so no NPC ends up
        // inside a later anchor's building.
        for (anchor, placed) in definition.anchors.iter().zip(&work.anchors) {
            for npc in &anchor.npcs {
                if !work.npc_positions.contains_key(npc) {
                    let spot =
                        default_npc_position(&work.grid, placed.bounds.center(), &mut work.rng);
                    work.npc_positions.insert(npc.clone(), spot);
                }
            }
        }

        work.chain_order = positioning_order(&definition.anchors);
        tracing::debug!(
            region = %definition.id,
            anchors = work.anchors.len(),
            doors = work.door_transitions.len(),
            "Anchors placed"
        );
        self.advance()
    }
}

impl<'a> RegionBuild<'a, AnchorsPlaced> {
    /// Move every entry anchor onto a tile a full-width road fits on, then
    /// reserve entries and doors so scatter cannot bury the ones no road
    /// reaches.
    #[must_use]
    pub fn settle_entries(mut self) -> RegionBuild<'a, EntriesSettled> {
        let work = &mut self.work;
        for anchor in &mut work.anchors {
            for entry in &mut anchor.entries {
                match nudge_entry(&work.grid, *entry, work.road_width) {
                    Some(nudged) => *entry = nudged,
                    None => {
                        tracing::warn!(
                            anchor = %anchor.id,
                            entry = %entry,
                            "Entry anchor could not be nudged"
                        );
                        work.degradations.push(Degradation::EntryNotNudged {
                            anchor: anchor.id.clone(),
                            entry: *entry,
                        });
                    }
                }
            }
        }

        let keep_open: Vec<TilePos> = work
            .anchors
            .iter()
            .flat_map(|a| a.entries.iter().copied().chain(a.layout.doors()))
            .collect();
        for tile in keep_open {
            if work.grid.get(tile) == Some(TileState::Passable) {
                work.grid.set(tile, TileState::Reserved);
            }
        }
        self.advance()
    }
}

impl<'a> RegionBuild<'a, EntriesSettled> {
    /// Plan and route every road.
    #[must_use]
    pub fn route(mut self) -> RegionBuild<'a, Routed> {
        let work = &mut self.work;
        let chained: Vec<&PlacedAnchor> =
            work.chain_order.iter().map(|&i| &work.anchors[i]).collect();
        let requests = plan_requests(
            &chained,
            &work.exits,
            self.inputs.definition.tissue.path_density,
            work.road_width,
        );
        work.routing = route_all(&mut work.grid, requests);
        tracing::debug!(
            region = %self.inputs.definition.id,
            routed = work.routing.routed.len(),
            unrouted = work.routing.unrouted.len(),
            "Roads routed"
        );
        self.advance()
    }
}

impl<'a> RegionBuild<'a, Routed> {
    /// Place wild features against the finished road network.
    #[must_use]
    pub fn place_wild_features(mut self) -> RegionBuild<'a, Featured> {
        let work = &mut self.work;
        let (features, shortfalls) = place_wild_features(
            &mut work.grid,
            &self.inputs.definition.tissue.wild_features,
            work.edge_depth,
            &mut work.rng,
        );
        for shortfall in &shortfalls {
            tracing::warn!(
                kind = %shortfall.kind,
                requested = shortfall.requested,
                placed = shortfall.placed,
                "Wild feature shortfall"
            );
        }
        tracing::debug!(
            region = %self.inputs.definition.id,
            placed = features.len(),
            "Wild features placed"
        );
        work.wild_features = features;
        work.wild_shortfalls = shortfalls;
        self.advance()
    }
}

impl<'a> RegionBuild<'a, Featured> {
    /// Reserve safe zones along main roads, when the region asks for them.
    #[must_use]
    pub fn place_safe_zones(mut self) -> RegionBuild<'a, Sheltered> {
        let work = &mut self.work;
        if let Some(interval) = self.inputs.definition.tissue.safe_zone_interval_minutes {
            let step = interval.saturating_mul(TILES_PER_MINUTE) as usize;
            work.safe_zones = place_safe_zones(
                &mut work.grid,
                &work.routing.routed,
                step,
                work.edge_depth,
                &mut work.rng,
            );
            tracing::debug!(
                region = %self.inputs.definition.id,
                zones = work.safe_zones.len(),
                "Safe zones reserved"
            );
        }
        self.advance()
    }
}

impl<'a> RegionBuild<'a, Sheltered> {
    /// Fill the remaining space and finish the region.
    #[must_use]
    pub fn fill(self) -> ComposedRegion {
        let inputs = self.inputs;
        let mut work = self.work;
        let mut fill_rng = SeededRng::new(work.rng.derive_seed());
        let fill = fill_region(&mut work.grid, inputs.biome, &work.gates, &mut fill_rng);

        tracing::info!(
            region = %inputs.definition.id,
            seed = inputs.seed,
            paths = work.routing.routed.len(),
            unrouted = work.routing.unrouted.len(),
            degradations = work.degradations.len(),
            "Region composed"
        );

        let region = ComposedRegion {
            id: inputs.definition.id.clone(),
            biome: inputs.biome.id.clone(),
            seed: inputs.seed,
            grid: work.grid,
            anchors: work.anchors,
            exits: work.exits,
            gate_tiles: work.gates,
            paths: work.routing.routed,
            unrouted: work.routing.unrouted,
            wild_features: work.wild_features,
            wild_shortfalls: work.wild_shortfalls,
            safe_zones: work.safe_zones,
            fill,
            door_transitions: work.door_transitions,
            npc_positions: work.npc_positions,
            degradations: work.degradations,
        };

        #[cfg(feature = "debug-validation")]
        {
            let report = crate::validation::validate_region(&region);
            debug_assert!(report.passed(), "{}: {:?}", report.scope, report.issues);
        }

        region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeRegistry;
    use crate::biome::BiomeRegistry;
    use crate::data::{
        AnchorDefinition, AnchorKind, Compass, ConnectionType, ConnectiveTissue, PositionHint,
        RegionDefinition, Service, ServiceType, TownDefinition, TownSize, WorldSlot,
    };
    use crate::math::Rect;
    use crate::region::{compose_region, ExitRequest, ANCHOR_BOX_GAP};
    use crate::validation::validate_region;

    fn region() -> RegionDefinition {
        RegionDefinition {
            id: "meadow".into(),
            biome: "plains".into(),
            time_budget_minutes: 30,
            difficulty: 1,
            anchors: vec![
                AnchorDefinition {
                    id: "millbrook".into(),
                    name: "Millbrook".into(),
                    kind: AnchorKind::Town(TownDefinition {
                        size: TownSize::Village,
                        services: vec![Service {
                            kind: ServiceType::Inn,
                            keeper: Some("martha".into()),
                        }],
                        house_count: 2,
                        central_feature: None,
                    }),
                    position: PositionHint::Start,
                    npcs: vec!["martha".into(), "old_tom".into()],
                    events: Vec::new(),
                    quests: Vec::new(),
                    world_slots: vec![WorldSlot {
                        slot: "inn".into(),
                        instance: "millbrook_inn".into(),
                    }],
                },
                AnchorDefinition {
                    id: "stones".into(),
                    name: "Standing Stones".into(),
                    kind: AnchorKind::Shrine,
                    position: PositionHint::End,
                    npcs: Vec::new(),
                    events: Vec::new(),
                    quests: Vec::new(),
                    world_slots: Vec::new(),
                },
            ],
            tissue: ConnectiveTissue::default(),
        }
    }

    fn compose(definition: &RegionDefinition, exits: &[ExitRequest], seed: u64) -> ComposedRegion {
        let biomes = BiomeRegistry::with_builtins();
        let archetypes = ArchetypeRegistry::new();
        let inputs = RegionInputs {
            definition,
            biome: biomes.get(&definition.biome).unwrap(),
            archetypes: &archetypes,
            exits,
            seed,
        };
        compose_region(&inputs)
    }

    #[test]
    fn test_region_output_shape() {
        let exits = [ExitRequest {
            target: "woods".into(),
            side: Compass::East,
            kind: ConnectionType::Road,
        }];
        let region = compose(&region(), &exits, 7);

        assert_eq!(region.grid.width(), 170);
        assert_eq!(region.anchors.len(), 2);
        assert_eq!(region.anchors[0].id, "millbrook");
        assert_eq!(region.exits.len(), 1);
        assert!(region.exit_to("woods").is_some());

        assert_eq!(region.door_transitions.len(), 1);
        assert_eq!(region.door_transitions[0].instance, "millbrook_inn");
        assert_eq!(region.door_transitions[0].anchor, "millbrook");

        assert!(region.npc_positions.contains_key("martha"));
        assert!(region.npc_positions.contains_key("old_tom"));
        assert!(region.paths.iter().any(|p| p.request.label == "main:millbrook->stones"));
        assert!(region.paths.iter().any(|p| p.request.label.starts_with("exit:woods")));
    }

    #[test]
    fn test_gates_stay_open() {
        let exits = [ExitRequest {
            target: "north".into(),
            side: Compass::North,
            kind: ConnectionType::Trail,
        }];
        let region = compose(&region(), &exits, 3);
        assert!(!region.gate_tiles.is_empty());
        for &t in &region.gate_tiles {
            assert_ne!(region.grid.get(t), Some(TileState::Blocked), "gate {t} closed");
        }
    }

    #[test]
    fn test_same_seed_same_region() {
        let definition = region();
        let a = compose(&definition, &[], 99);
        let b = compose(&definition, &[], 99);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        let c = compose(&definition, &[], 100);
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }

    #[test]
    fn test_phases_can_be_inspected() {
        let definition = region();
        let biomes = BiomeRegistry::with_builtins();
        let archetypes = ArchetypeRegistry::new();
        let inputs = RegionInputs {
            definition: &definition,
            biome: biomes.get("plains").unwrap(),
            archetypes: &archetypes,
            exits: &[],
            seed: 1,
        };

        let build = RegionBuild::new(&inputs);
        assert_eq!(build.grid().count(TileState::Blocked), 0);

        let placed = build.place_anchors();
        assert_eq!(placed.anchors().len(), 2);
        assert!(placed.grid().count(TileState::Blocked) > 0);
        assert_eq!(placed.grid().count(TileState::Road), 0);

        let routed = placed.settle_entries().route();
        assert!(routed.grid().count(TileState::Road) > 0);
    }

    #[test]
    fn test_settled_entries_and_doors_are_reserved() {
        let definition = region();
        let biomes = BiomeRegistry::with_builtins();
        let archetypes = ArchetypeRegistry::new();
        for seed in 0..10 {
            let inputs = RegionInputs {
                definition: &definition,
                biome: biomes.get("plains").unwrap(),
                archetypes: &archetypes,
                exits: &[],
                seed,
            };
            let settled = RegionBuild::new(&inputs).place_anchors().settle_entries();
            for anchor in settled.anchors() {
                let tiles = anchor.entries.iter().copied().chain(anchor.layout.doors());
                for tile in tiles {
                    assert_ne!(
                        settled.grid().get(tile),
                        Some(TileState::Passable),
                        "seed {seed}: {tile} of {} left open to scatter",
                        anchor.id
                    );
                }
            }
        }
    }

    fn crowded() -> RegionDefinition {
        let village = |id: &str| AnchorDefinition {
            id: id.into(),
            name: String::new(),
            kind: AnchorKind::Town(TownDefinition {
                size: TownSize::Village,
                house_count: 2,
                ..Default::default()
            }),
            position: PositionHint::Middle,
            npcs: Vec::new(),
            events: Vec::new(),
            quests: Vec::new(),
            world_slots: Vec::new(),
        };
        let mut definition = region();
        definition.id = "crowded".into();
        definition.time_budget_minutes = 5;
        let shrine = definition.anchors.pop().unwrap();
        definition.anchors = vec![village("a"), village("b"), village("c"), shrine];
        definition
    }

    #[test]
    fn test_crowded_region_keeps_boxes_apart() {
        let exits = [ExitRequest {
            target: "east".into(),
            side: Compass::East,
            kind: ConnectionType::Road,
        }];
        let definition = crowded();
        for seed in 0..20 {
            let region = compose(&definition, &exits, seed);
            assert_eq!(region.grid.width(), 80);
            assert!(region
                .degradations
                .iter()
                .any(|d| matches!(d, Degradation::AnchorMoved { .. })));

            let boxes: Vec<Rect> = region.anchors.iter().map(|a| a.bounds).collect();
            for (i, a) in boxes.iter().enumerate() {
                for b in &boxes[i + 1..] {
                    assert!(!a.inflate(ANCHOR_BOX_GAP).intersects(b), "seed {seed}");
                }
            }

            let report = validate_region(&region);
            assert!(report.passed(), "seed {seed}: {:?}", report.issues);
        }
    }
}
