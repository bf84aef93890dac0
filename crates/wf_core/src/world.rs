//! World composition: every requested region, its exits and child worlds.
//!
//! Regions never share grid state. Each gets a seed derived from the world
//! seed and its own id, so composing a subset of regions reproduces exactly
//! the same maps as composing the whole world.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeRegistry;
use crate::biome::BiomeRegistry;
use crate::data::{
    bind_instances, check_structure, BoundInstance, Compass, ConnectionType, RegionDefinition,
    StartPoint, WorldDefinition, WorldInstanceDefinition, WorldTemplate,
};
use crate::error::{GenError, Result};
use crate::loader::WorldLoader;
use crate::math::TilePos;
use crate::region::{compose_region, ComposedRegion, ExitRequest, RegionInputs};
use crate::rng::fnv1a;

/// Tile reported for connection ends whose region was not composed.
pub const UNRESOLVED_EXIT_POSITION: TilePos = TilePos::new(-1, -1);

/// All the data a world composition reads.
#[derive(Debug, Clone)]
pub struct WorldBundle {
    /// The world graph.
    pub world: WorldDefinition,
    /// Child world instances.
    pub instances: Vec<WorldInstanceDefinition>,
    /// Child world templates.
    pub templates: Vec<WorldTemplate>,
    /// Biome profiles.
    pub biomes: BiomeRegistry,
    /// Building archetypes.
    pub archetypes: ArchetypeRegistry,
}

impl WorldBundle {
    /// Bundle a world with the built-in biomes and nothing else.
    #[must_use]
    pub fn new(world: WorldDefinition) -> Self {
        Self {
            world,
            instances: Vec::new(),
            templates: Vec::new(),
            biomes: BiomeRegistry::with_builtins(),
            archetypes: ArchetypeRegistry::new(),
        }
    }

    /// Structural checks plus biome resolution for every region.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn check(&self) -> Result<()> {
        check_structure(&self.world, &self.instances, &self.templates)?;
        for region in &self.world.regions {
            self.biomes.get(&region.biome)?;
        }
        Ok(())
    }
}

/// Caller-controlled composition options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeOptions {
    /// Overrides the world's own seed.
    pub seed: Option<u64>,
    /// Compose only these regions. `None` composes all of them.
    pub regions: Option<Vec<String>>,
}

/// A connection with its tiles resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConnection {
    /// Source region.
    pub from: String,
    /// Target region.
    pub to: String,
    /// Connection type.
    pub kind: ConnectionType,
    /// Unlock condition.
    pub unlock: Option<String>,
    /// Side of the source region.
    pub direction: Compass,
    /// Exit tile in the source region.
    pub source_tile: TilePos,
    /// Exit tile in the target region.
    pub target_tile: TilePos,
}

impl ResolvedConnection {
    /// Whether both ends were composed.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.source_tile != UNRESOLVED_EXIT_POSITION && self.target_tile != UNRESOLVED_EXIT_POSITION
    }
}

/// A composed world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedWorld {
    /// World name.
    pub name: String,
    /// Seed actually used.
    pub seed: u64,
    /// Start point.
    pub start: StartPoint,
    /// Composed regions in declaration order.
    pub regions: Vec<ComposedRegion>,
    /// Every declared connection.
    pub connections: Vec<ResolvedConnection>,
    /// Child worlds joined with their templates.
    pub instances: Vec<BoundInstance>,
}

impl ComposedWorld {
    /// Look up a composed region.
    #[must_use]
    pub fn region(&self, id: &str) -> Option<&ComposedRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Stable hash of the whole world.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn fingerprint(&self) -> Result<u64> {
        bincode::serialize(self)
            .map(|bytes| fnv1a(&bytes))
            .map_err(|e| GenError::Serialization(format!("Failed to serialize world: {e}")))
    }
}

/// Seed for one region: FNV-1a of its id mixed with the world seed.
#[must_use]
pub fn region_seed(world_seed: u64, region_id: &str) -> u64 {
    fnv1a(region_id.as_bytes()) ^ world_seed
}

/// Exits a region must provide, in connection order. The source side of a
/// connection exits in its declared direction, the target side opposite.
#[must_use]
pub fn exit_requests(world: &WorldDefinition, region_id: &str) -> Vec<ExitRequest> {
    let mut exits = Vec::new();
    for conn in &world.connections {
        if conn.from == region_id {
            exits.push(ExitRequest {
                target: conn.to.clone(),
                side: conn.direction,
                kind: conn.kind,
            });
        }
        if conn.to == region_id {
            exits.push(ExitRequest {
                target: conn.from.clone(),
                side: conn.direction.opposite(),
                kind: conn.kind,
            });
        }
    }
    exits
}

fn selected_regions<'w>(
    world: &'w WorldDefinition,
    options: &ComposeOptions,
) -> Result<Vec<&'w RegionDefinition>> {
    let Some(requested) = &options.regions else {
        return Ok(world.regions.iter().collect());
    };
    for id in requested {
        if world.region(id).is_none() {
            return Err(GenError::UnknownRegion {
                region: id.clone(),
                context: "the compose options".into(),
            });
        }
    }
    Ok(world
        .regions
        .iter()
        .filter(|r| requested.contains(&r.id))
        .collect())
}

fn exit_tile(regions: &[ComposedRegion], region: &str, target: &str, side: Compass) -> TilePos {
    regions
        .iter()
        .find(|r| r.id == region)
        .and_then(|r| r.exits.iter().find(|e| e.target == target && e.side == side))
        .map_or(UNRESOLVED_EXIT_POSITION, |e| e.position)
}

/// Compose a world from pre-loaded data.
///
/// # Errors
///
/// Returns structural errors from [`WorldBundle::check`] and unknown region
/// ids in `options`. Spatial problems are never errors.
pub fn compose_world(bundle: &WorldBundle, options: &ComposeOptions) -> Result<ComposedWorld> {
    bundle.check()?;
    let world = &bundle.world;
    let seed = options.seed.unwrap_or(world.seed);

    let mut regions = Vec::new();
    for definition in selected_regions(world, options)? {
        let exits = exit_requests(world, &definition.id);
        let inputs = RegionInputs {
            definition,
            biome: bundle.biomes.get(&definition.biome)?,
            archetypes: &bundle.archetypes,
            exits: &exits,
            seed: region_seed(seed, &definition.id),
        };
        regions.push(compose_region(&inputs));
    }

    let connections: Vec<ResolvedConnection> = world
        .connections
        .iter()
        .map(|conn| ResolvedConnection {
            from: conn.from.clone(),
            to: conn.to.clone(),
            kind: conn.kind,
            unlock: conn.unlock.clone(),
            direction: conn.direction,
            source_tile: exit_tile(&regions, &conn.from, &conn.to, conn.direction),
            target_tile: exit_tile(&regions, &conn.to, &conn.from, conn.direction.opposite()),
        })
        .collect();

    let instances = bind_instances(&bundle.instances, &bundle.templates)?;

    tracing::info!(
        world = %world.name,
        seed,
        regions = regions.len(),
        connections = connections.len(),
        "World composed"
    );

    Ok(ComposedWorld {
        name: world.name.clone(),
        seed,
        start: world.start.clone(),
        regions,
        connections,
        instances,
    })
}

/// Load a data root with [`WorldLoader`] and compose it.
///
/// # Errors
///
/// Returns loader errors and everything [`compose_world`] returns.
pub fn compose_world_from_path(
    root: impl AsRef<Path>,
    options: &ComposeOptions,
) -> Result<ComposedWorld> {
    let bundle = WorldLoader::load(root)?;
    compose_world(&bundle, options)
}
