//! Declarative world data.
//!
//! Pure data structures for the world → region → anchor graph, designed to
//! be deserialized from RON files. They are constructed once, validated with
//! [`check_structure`], and never mutated by the composers.
//!
//! **Note:** This module contains no IO. File loading is handled by
//! [`crate::loader`].

mod anchor;
mod instance;
mod region;
mod world;

use std::collections::{HashMap, HashSet};

pub use anchor::{
    AnchorDefinition, AnchorKind, AnchorTag, DungeonDefinition, PositionHint, Service,
    ServiceType, TownDefinition, TownSize, WorldSlot,
};
pub use instance::{BoundInstance, InstanceKind, WorldInstanceDefinition, WorldTemplate};
pub use region::{ConnectiveTissue, RegionDefinition, WildFeatureRule, WildPlacement};
pub use world::{Compass, ConnectionType, RegionConnection, StartPoint, WorldDefinition};

use crate::error::{GenError, Result};

/// Check the structural invariants of a world declaration.
///
/// - region ids are unique, anchor ids are unique across the whole world,
/// - every connection endpoint and the start point name declared regions,
/// - the start anchor exists in the start region,
/// - time budgets are positive and path densities lie in `[0, 1]`,
/// - every world slot names a declared instance and every instance names a
///   declared template (when `instances` is non-empty or any slot exists).
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn check_structure(
    world: &WorldDefinition,
    instances: &[WorldInstanceDefinition],
    templates: &[WorldTemplate],
) -> Result<()> {
    let mut region_ids = HashSet::new();
    let mut anchor_ids = HashSet::new();

    for region in &world.regions {
        if !region_ids.insert(region.id.as_str()) {
            return Err(GenError::DuplicateRegionId(region.id.clone()));
        }
        if region.time_budget_minutes == 0 {
            return Err(GenError::InvalidDefinition(format!(
                "region '{}' has a zero time budget",
                region.id
            )));
        }
        let density = region.tissue.path_density;
        if !(0.0..=1.0).contains(&density) {
            return Err(GenError::InvalidDefinition(format!(
                "region '{}' path density {density} is outside [0, 1]",
                region.id
            )));
        }
        for anchor in &region.anchors {
            if !anchor_ids.insert(anchor.id.as_str()) {
                return Err(GenError::DuplicateAnchorId(anchor.id.clone()));
            }
        }
    }

    let start_region =
        world
            .region(&world.start.region)
            .ok_or_else(|| GenError::UnknownRegion {
                region: world.start.region.clone(),
                context: "the world start point".into(),
            })?;
    if start_region.anchor(&world.start.anchor).is_none() {
        return Err(GenError::UnknownStartAnchor {
            region: world.start.region.clone(),
            anchor: world.start.anchor.clone(),
        });
    }

    for conn in &world.connections {
        for endpoint in [&conn.from, &conn.to] {
            if !region_ids.contains(endpoint.as_str()) {
                return Err(GenError::UnknownRegion {
                    region: endpoint.clone(),
                    context: format!("connection {} -> {}", conn.from, conn.to),
                });
            }
        }
    }

    let instance_ids: HashSet<&str> = instances.iter().map(|i| i.id.as_str()).collect();
    for region in &world.regions {
        for anchor in &region.anchors {
            for slot in &anchor.world_slots {
                if !instance_ids.contains(slot.instance.as_str()) {
                    return Err(GenError::UnknownWorldInstance {
                        anchor: anchor.id.clone(),
                        instance: slot.instance.clone(),
                    });
                }
            }
        }
    }

    let template_ids: HashSet<&str> = templates.iter().map(|t| t.id.as_str()).collect();
    for instance in instances {
        if !template_ids.contains(instance.template.as_str()) {
            return Err(GenError::UnknownTemplate {
                instance: instance.id.clone(),
                template: instance.template.clone(),
            });
        }
    }

    Ok(())
}

/// Join every instance with its template.
///
/// # Errors
///
/// Returns [`GenError::UnknownTemplate`] for an instance whose template is
/// not declared.
pub fn bind_instances(
    instances: &[WorldInstanceDefinition],
    templates: &[WorldTemplate],
) -> Result<Vec<BoundInstance>> {
    let by_id: HashMap<&str, &WorldTemplate> =
        templates.iter().map(|t| (t.id.as_str(), t)).collect();
    instances
        .iter()
        .map(|instance| {
            by_id
                .get(instance.template.as_str())
                .map(|template| BoundInstance {
                    instance: instance.clone(),
                    template: (*template).clone(),
                })
                .ok_or_else(|| GenError::UnknownTemplate {
                    instance: instance.id.clone(),
                    template: instance.template.clone(),
                })
        })
        .collect()
}
