//! Data validation utilities.

use std::path::Path;

use serde::Serialize;
use wf_core::loader::WorldLoader;

use crate::error::Result;

/// What a valid data root holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    /// World name.
    pub world: String,
    /// Declared regions.
    pub regions: usize,
    /// Declared connections.
    pub connections: usize,
    /// Loaded child world instances.
    pub instances: usize,
    /// Loaded child world templates.
    pub templates: usize,
    /// Loaded archetypes.
    pub archetypes: usize,
}

/// Load a data root and run every structural check without composing.
///
/// # Errors
///
/// Returns the first load or structural error.
pub fn validate_data_directory(path: &Path) -> Result<DataSummary> {
    let bundle = WorldLoader::load(path)?;
    bundle.check()?;

    Ok(DataSummary {
        world: bundle.world.name.clone(),
        regions: bundle.world.regions.len(),
        connections: bundle.world.connections.len(),
        instances: bundle.instances.len(),
        templates: bundle.templates.len(),
        archetypes: bundle.archetypes.len(),
    })
}
