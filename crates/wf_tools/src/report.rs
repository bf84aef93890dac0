//! Composition summaries and verification reports.
//!
//! Everything here is `Serialize` so the CLI can print it as JSON.

use std::path::Path;

use serde::Serialize;
use wf_core::region::ComposedRegion;
use wf_core::router::PathPriority;
use wf_core::validation::{validate_world, WorldValidation};
use wf_core::world::{compose_world_from_path, ComposeOptions, ComposedWorld};

use crate::error::{Result, ToolError};

/// One line of the `compose` summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    /// Region id.
    pub id: String,
    /// Biome id.
    pub biome: String,
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Placed anchors.
    pub anchors: usize,
    /// Routed main roads.
    pub main_roads: usize,
    /// Routed branches and internal footpaths.
    pub side_paths: usize,
    /// Requests the router gave up on.
    pub unrouted: usize,
    /// Wild features placed.
    pub wild_features: usize,
    /// Safe zones placed.
    pub safe_zones: usize,
    /// Doors into child worlds.
    pub doors: usize,
    /// Scattered objects.
    pub scatter: usize,
    /// Compromises made during the build.
    pub degradations: usize,
    /// Region fingerprint.
    pub fingerprint: u64,
}

impl RegionSummary {
    /// Summarize a composed region.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot be fingerprinted.
    pub fn of(region: &ComposedRegion) -> Result<Self> {
        let main_roads = region
            .paths
            .iter()
            .filter(|p| p.request.priority == PathPriority::Main)
            .count();

        Ok(Self {
            id: region.id.clone(),
            biome: region.biome.clone(),
            width: region.grid.width(),
            height: region.grid.height(),
            anchors: region.anchors.len(),
            main_roads,
            side_paths: region.paths.len() - main_roads,
            unrouted: region.unrouted.len(),
            wild_features: region.wild_features.len(),
            safe_zones: region.safe_zones.len(),
            doors: region.door_transitions.len(),
            scatter: region.fill.scatter.len(),
            degradations: region.degradations.len(),
            fingerprint: region.fingerprint()?,
        })
    }
}

/// The `compose` summary for a whole world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldSummary {
    /// World name.
    pub name: String,
    /// Seed used.
    pub seed: u64,
    /// Per-region summaries in declaration order.
    pub regions: Vec<RegionSummary>,
    /// Connections declared.
    pub connections: usize,
    /// Connections with an end outside the composed subset.
    pub unresolved_connections: usize,
    /// World fingerprint.
    pub fingerprint: u64,
}

impl WorldSummary {
    /// Summarize a composed world.
    ///
    /// # Errors
    ///
    /// Returns an error if the world cannot be fingerprinted.
    pub fn of(world: &ComposedWorld) -> Result<Self> {
        Ok(Self {
            name: world.name.clone(),
            seed: world.seed,
            regions: world
                .regions
                .iter()
                .map(RegionSummary::of)
                .collect::<Result<_>>()?,
            connections: world.connections.len(),
            unresolved_connections: world.connections.iter().filter(|c| !c.is_resolved()).count(),
            fingerprint: world.fingerprint()?,
        })
    }
}

/// Output of the `verify` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// What was composed.
    pub summary: WorldSummary,
    /// Validation findings.
    pub validation: WorldValidation,
}

impl VerifyReport {
    /// Error-severity issues across the world and every region.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.validation.world.errors().count()
            + self
                .validation
                .regions
                .iter()
                .map(|r| r.errors().count())
                .sum::<usize>()
    }

    /// `Ok` when validation passed, [`ToolError::ValidationFailed`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::ValidationFailed`] with the error count.
    pub fn into_result(self) -> Result<Self> {
        match self.error_count() {
            0 => Ok(self),
            errors => Err(ToolError::ValidationFailed { errors }),
        }
    }
}

/// Compose the world at `root` and summarize it.
///
/// # Errors
///
/// Returns load, structural or serialization errors.
pub fn compose(root: &Path, options: &ComposeOptions) -> Result<(ComposedWorld, WorldSummary)> {
    let world = compose_world_from_path(root, options)?;
    let summary = WorldSummary::of(&world)?;
    Ok((world, summary))
}

/// Compose the world at `root` and validate it.
///
/// A failing validation still returns `Ok`; use
/// [`VerifyReport::into_result`] to turn it into an error.
///
/// # Errors
///
/// Returns load, structural or serialization errors.
pub fn verify(root: &Path, options: &ComposeOptions) -> Result<VerifyReport> {
    let (world, summary) = compose(root, options)?;
    let validation = validate_world(&world);
    Ok(VerifyReport { summary, validation })
}

/// Pretty-printed JSON for any report.
///
/// # Errors
///
/// Returns [`ToolError::Json`] if encoding fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
