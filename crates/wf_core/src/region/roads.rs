//! Road network planning: which pairs of tiles get connected, and how.

use crate::math::TilePos;
use crate::router::{PathPriority, PathRequest};

use super::placement::PlacedAnchor;
use super::sizing::RegionExit;

/// Non-adjacent anchors closer than this get a branch road.
pub const BRANCH_MAX_DISTANCE: u32 = 80;
/// Width of footpaths inside organisms.
pub const INTERNAL_PATH_WIDTH: u32 = 1;

/// Closest pair of tiles between two entry lists. Ties go to the first pair
/// found.
fn closest_pair(a: &[TilePos], b: &[TilePos]) -> Option<(TilePos, TilePos, u32)> {
    let mut best: Option<(TilePos, TilePos, u32)> = None;
    for &p in a {
        for &q in b {
            let d = p.manhattan(q);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((p, q, d));
            }
        }
    }
    best
}

/// Build every path request for a region.
///
/// `anchors` must be in chaining order. Requests come out as main roads,
/// then branches, then internal paths, each group in a stable order.
#[must_use]
pub fn plan_requests(
    anchors: &[&PlacedAnchor],
    exits: &[RegionExit],
    path_density: f64,
    road_width: u32,
) -> Vec<PathRequest> {
    let mut requests = Vec::new();

    for pair in anchors.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if let Some((from, to, _)) = closest_pair(&a.entries, &b.entries) {
            requests.push(PathRequest {
                from,
                to,
                priority: PathPriority::Main,
                width: road_width,
                label: format!("main:{}->{}", a.id, b.id),
            });
        }
    }

    let all_entries: Vec<(TilePos, &str)> = anchors
        .iter()
        .flat_map(|a| a.entries.iter().map(move |&e| (e, a.id.as_str())))
        .collect();
    for exit in exits {
        let nearest = all_entries
            .iter()
            .min_by_key(|(e, _)| exit.position.manhattan(*e));
        if let Some(&(to, anchor)) = nearest {
            requests.push(PathRequest {
                from: exit.position,
                to,
                priority: PathPriority::Main,
                width: road_width,
                label: format!("exit:{}->{}", exit.target, anchor),
            });
        }
    }
    if anchors.is_empty() {
        for pair in exits.windows(2) {
            requests.push(PathRequest {
                from: pair[0].position,
                to: pair[1].position,
                priority: PathPriority::Main,
                width: road_width,
                label: format!("through:{}->{}", pair[0].target, pair[1].target),
            });
        }
    }

    if path_density > 0.0 {
        for i in 0..anchors.len() {
            for j in i + 2..anchors.len() {
                let (a, b) = (anchors[i], anchors[j]);
                if let Some((from, to, d)) = closest_pair(&a.entries, &b.entries) {
                    if d <= BRANCH_MAX_DISTANCE {
                        requests.push(PathRequest {
                            from,
                            to,
                            priority: PathPriority::Branch,
                            width: road_width,
                            label: format!("branch:{}->{}", a.id, b.id),
                        });
                    }
                }
            }
        }
    }

    for anchor in anchors {
        for (from, to) in anchor.layout.internal_routes() {
            requests.push(PathRequest {
                from,
                to,
                priority: PathPriority::Internal,
                width: INTERNAL_PATH_WIDTH,
                label: format!("internal:{}", anchor.id),
            });
        }
    }

    requests
}
