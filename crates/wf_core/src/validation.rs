//! Aggregated validation at organism, region and world level.
//!
//! Traversal failures are errors. Everything the composers degraded on
//! (fallback placements, unrouted paths, shortfalls, placeholder buildings)
//! is a warning: the map is still usable, but someone should look at it.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::grid::{CollisionGrid, TileState};
use crate::math::TilePos;
use crate::organism::OrganismLayout;
use crate::region::ComposedRegion;
use crate::traversal::{verify_traversal, TraversalReport};
use crate::world::ComposedWorld;

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Degraded but usable.
    Warning,
    /// The map fails its guarantees.
    Error,
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

/// Findings for one layout, region or world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// What was validated (`region:meadow`, `layout`, `world:vale`).
    pub scope: String,
    /// Traversal check, when one ran.
    pub traversal: Option<TraversalReport>,
    /// Findings in discovery order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            traversal: None,
            issues: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    fn record_traversal(&mut self, report: TraversalReport) {
        for target in report.unreached() {
            self.error(format!("target {} is unreachable", target.target));
        }
        for zone in &report.disconnected_zones {
            self.error(format!(
                "disconnected zone of {} tiles at {}",
                zone.size, zone.representative
            ));
        }
        self.traversal = Some(report);
    }

    /// True when no issue is an error.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Error issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Warning issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// Validate one organism layout in isolation.
///
/// The layout is stamped into a scratch grid where everything outside its
/// box is blocked, then every door must be reachable from the entries.
#[must_use]
pub fn validate_layout(layout: &OrganismLayout) -> ValidationReport {
    let mut report = ValidationReport::new("layout");
    let bounds = layout.bounds();

    let mut grid = CollisionGrid::new(bounds.right().max(1) as u32, bounds.bottom().max(1) as u32);
    let full = grid.bounds();
    for p in full.tiles().filter(|p| !bounds.contains(*p)) {
        grid.set(p, TileState::Blocked);
    }
    layout.stamp(&mut grid);

    for building in layout.buildings() {
        if building.outcome.is_degraded() {
            report.warn(format!(
                "{} placed as {:?}",
                building.kind.archetype_id(),
                building.outcome
            ));
        }
    }
    for archetype in layout.archetype_fallbacks() {
        report.warn(format!("placeholder used for {archetype}"));
    }

    report.record_traversal(verify_traversal(&grid, &layout.entry_anchors(), &layout.doors()));
    report
}

/// Traversal entries for a region: its exits, or the first anchor entry when
/// it has none.
fn region_entries(region: &ComposedRegion) -> Vec<TilePos> {
    if region.exits.is_empty() {
        region
            .anchors
            .iter()
            .filter_map(|a| a.entries.first().copied())
            .take(1)
            .collect()
    } else {
        region.exits.iter().map(|e| e.position).collect()
    }
}

/// Validate a composed region.
#[must_use]
pub fn validate_region(region: &ComposedRegion) -> ValidationReport {
    let mut report = ValidationReport::new(format!("region:{}", region.id));

    let entries = region_entries(region);
    let mut targets = region.entry_tiles();
    targets.extend(region.doors());
    targets.extend(region.exits.iter().map(|e| e.position));
    targets.extend(region.wild_features.iter().map(|f| f.position));
    targets.extend(region.safe_zones.iter().map(|z| z.area.center()));

    if entries.is_empty() && !targets.is_empty() {
        report.error("region has neither exits nor anchor entries");
    }
    report.record_traversal(verify_traversal(&region.grid, &entries, &targets));

    for degradation in &region.degradations {
        report.warn(degradation.to_string());
    }
    for request in &region.unrouted {
        report.warn(format!("no route for {}", request.label));
    }
    for shortfall in &region.wild_shortfalls {
        report.warn(format!(
            "placed {} of {} {}",
            shortfall.placed, shortfall.requested, shortfall.kind
        ));
    }
    for shortfall in &region.fill.shortfalls {
        report.warn(format!(
            "scattered {} of {} {}",
            shortfall.placed, shortfall.expected, shortfall.object
        ));
    }

    report
}

/// World-level findings plus one report per composed region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldValidation {
    /// Graph-level findings.
    pub world: ValidationReport,
    /// Per-region reports in region order.
    pub regions: Vec<ValidationReport>,
}

impl WorldValidation {
    /// True when no report carries an error.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.world.passed() && self.regions.iter().all(ValidationReport::passed)
    }
}

/// Regions reachable from `start` over connections taken as undirected edges.
fn reachable_regions(world: &ComposedWorld) -> BTreeSet<&str> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    seen.insert(world.start.region.as_str());
    queue.push_back(world.start.region.as_str());

    while let Some(current) = queue.pop_front() {
        for conn in &world.connections {
            let next = if conn.from == current {
                conn.to.as_str()
            } else if conn.to == current {
                conn.from.as_str()
            } else {
                continue;
            };
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Validate a composed world.
#[must_use]
pub fn validate_world(world: &ComposedWorld) -> WorldValidation {
    let mut report = ValidationReport::new(format!("world:{}", world.name));

    let reachable = reachable_regions(world);
    for region in &world.regions {
        if !reachable.contains(region.id.as_str()) {
            report.error(format!(
                "region {} is not connected to the start region {}",
                region.id, world.start.region
            ));
        }
    }
    for conn in world.connections.iter().filter(|c| !c.is_resolved()) {
        report.warn(format!("connection {} -> {} is unresolved", conn.from, conn.to));
    }
    for bound in &world.instances {
        if !bound.entry_in_bounds() {
            report.warn(format!(
                "instance {} enters template {} outside its bounds",
                bound.instance.id, bound.template.id
            ));
        }
    }

    let regions: Vec<ValidationReport> = world.regions.iter().map(validate_region).collect();
    let validation = WorldValidation {
        world: report,
        regions,
    };
    tracing::info!(world = %world.name, passed = validation.passed(), "World validated");
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeRegistry;
    use crate::data::{AnchorTag, Service, ServiceType, TownDefinition, TownSize};
    use crate::math::Rect;
    use crate::organism::{layout_hamlet, layout_landmark, layout_town, HamletConfig};

    fn town_fixture() -> OrganismLayout {
        let town = TownDefinition {
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
        };
        let ids: Vec<String> = (0..4).map(|i| format!("interior_{i}")).collect();
        OrganismLayout::Town(layout_town(
            Rect::new(0, 0, 45, 45),
            &town,
            &ids,
            42,
            &ArchetypeRegistry::new(),
        ))
    }

    #[test]
    fn test_town_fixture_traversal_passes() {
        let report = validate_layout(&town_fixture());
        assert!(report.passed(), "{:?}", report.issues);
        let traversal = report.traversal.as_ref().unwrap();
        assert_eq!(traversal.targets.len(), 7);
        assert!(traversal.disconnected_zones.is_empty());
        // Placeholder archetypes only warn.
        assert!(report.warnings().count() > 0);
    }

    #[test]
    fn test_hamlet_fixture_traversal_passes() {
        let layout = OrganismLayout::Hamlet(layout_hamlet(
            Rect::new(0, 0, 30, 30),
            &HamletConfig::default(),
            42,
            &ArchetypeRegistry::new(),
        ));
        assert!(validate_layout(&layout).passed());
    }

    #[test]
    fn test_offset_layout_uses_its_box() {
        let layout = OrganismLayout::Landmark(layout_landmark(
            Rect::new(30, 40, 15, 15),
            AnchorTag::Shrine,
            &[],
            &ArchetypeRegistry::new(),
        ));
        let report = validate_layout(&layout);
        assert!(report.passed(), "{:?}", report.issues);
    }

    #[test]
    fn test_walled_in_door_fails() {
        let layout = town_fixture();
        let mut grid = CollisionGrid::new(45, 45);
        layout.stamp(&mut grid);
        let door = layout.doors()[0];
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1)] {
            grid.set(door.offset(dx, dy), TileState::Blocked);
        }
        let mut report = ValidationReport::new("layout");
        report.record_traversal(verify_traversal(&grid, &layout.entry_anchors(), &[door]));
        assert!(!report.passed());
    }
}
