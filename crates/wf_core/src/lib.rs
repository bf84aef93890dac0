//! # Worldforge Core
//!
//! Deterministic world composition for tile-based outdoor maps.
//!
//! Given a declarative world (regions, anchors, connections) and a seed,
//! this crate lays out towns and landmarks, carves roads between them, fills
//! the remaining space from a biome profile and proves every point of
//! interest is reachable on foot.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No system randomness (one seeded RNG per region run)
//! - Fixed-point path costs
//! - No IO outside the explicit [`loader`]
//!
//! The same declaration and seed always produce byte-identical output, which
//! [`region::ComposedRegion::fingerprint`] checks cheaply.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Collision grid shared by every phase
//! - [`organism`] - Hamlet, town and landmark layouts
//! - [`router`] - A* road router
//! - [`fill`] - Biome fill
//! - [`region`] - Region composer
//! - [`world`] - World composer
//! - [`traversal`] / [`validation`] - Reachability checks

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetype;
pub mod biome;
pub mod data;
pub mod error;
pub mod fill;
pub mod grid;
pub mod loader;
pub mod math;
pub mod organism;
pub mod region;
pub mod rng;
pub mod router;
pub mod traversal;
pub mod validation;
pub mod world;

pub use error::{GenError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archetype::{Archetype, ArchetypeRegistry, ArchetypeSource};
    pub use crate::biome::{BiomeProfile, BiomeRegistry};
    pub use crate::data::{
        AnchorDefinition, AnchorKind, PositionHint, RegionDefinition, TownDefinition,
        WorldDefinition,
    };
    pub use crate::error::{GenError, Result};
    pub use crate::grid::{CollisionGrid, TileState};
    pub use crate::loader::WorldLoader;
    pub use crate::math::{Fixed, Rect, TilePos};
    pub use crate::organism::OrganismLayout;
    pub use crate::region::{compose_region, ComposedRegion, RegionInputs};
    pub use crate::rng::SeededRng;
    pub use crate::traversal::{verify_traversal, TraversalReport};
    pub use crate::validation::{validate_region, validate_world, ValidationReport};
    pub use crate::world::{compose_world, compose_world_from_path, ComposeOptions, WorldBundle};
}
