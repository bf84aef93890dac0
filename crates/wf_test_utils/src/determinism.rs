//! Determinism testing utilities.
//!
//! Provides a harness for verifying that composition produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A world must compose to the same bytes on every run and every platform.
//! Sources of non-determinism include:
//!
//! - **Floating-point path costs**: The router accumulates costs in
//!   [`wf_core::math::Fixed`]; ties are broken on cell index.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Composition output only uses `Vec`, `BTreeMap` and `BTreeSet`.
//!
//! - **RNG draw order**: One [`wf_core::rng::SeededRng`] per region, consumed
//!   in a fixed phase order. An extra draw anywhere shifts every later
//!   placement.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual layouts and the router
//! 2. **Property tests**: Random seeds and declarations still compose
//!    deterministically
//! 3. **Integration tests**: Whole regions and worlds are reproducible
//! 4. **Parallel tests**: Composing N worlds on N threads all match

use std::thread;

use wf_core::region::{ComposedRegion, RegionBuild, RegionInputs};
use wf_core::world::{compose_world, ComposeOptions, WorldBundle};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Fingerprints from each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic composition).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different fingerprints.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Composition is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Build something `runs` times and compare fingerprints.
///
/// # Example
///
/// ```ignore
/// use wf_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     5,
///     || compose_region(&inputs),
///     |region| region.fingerprint().unwrap(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, HashFn>(
    runs: usize,
    setup: Setup,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs).map(|_| hash(&setup())).collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Compose a world `runs` times and compare fingerprints.
///
/// # Panics
///
/// Panics if the bundle fails its structural checks.
pub fn verify_world_determinism(
    bundle: &WorldBundle,
    options: &ComposeOptions,
    runs: usize,
) -> DeterminismResult {
    verify_determinism(
        runs,
        || compose_world(bundle, options).expect("fixture world composes"),
        |world| world.fingerprint().expect("world serializes"),
    )
}

/// Compose the same world on `num_threads` threads.
///
/// # Panics
///
/// Panics if a composing thread panics.
pub fn run_parallel_compositions(
    bundle: &WorldBundle,
    options: &ComposeOptions,
    num_threads: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                s.spawn(|| {
                    compose_world(bundle, options)
                        .and_then(|world| world.fingerprint())
                        .expect("fixture world composes")
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Run two region builds side by side and name the first phase after which
/// their grids differ.
///
/// Useful for debugging non-determinism by finding exactly which phase
/// starts to diverge. Returns `None` when both builds match throughout.
#[must_use]
pub fn find_first_divergent_phase(inputs: &RegionInputs<'_>) -> Option<&'static str> {
    let (a, b) = (RegionBuild::new(inputs), RegionBuild::new(inputs));
    if a.grid() != b.grid() {
        return Some("sizing");
    }
    let (a, b) = (a.place_anchors(), b.place_anchors());
    if a.grid() != b.grid() {
        return Some("anchors");
    }
    let (a, b) = (a.settle_entries(), b.settle_entries());
    if a.anchors() != b.anchors() {
        return Some("entries");
    }
    let (a, b) = (a.route(), b.route());
    if a.grid() != b.grid() {
        return Some("roads");
    }
    let (a, b) = (a.place_wild_features(), b.place_wild_features());
    if a.grid() != b.grid() {
        return Some("wild features");
    }
    let (a, b) = (a.place_safe_zones(), b.place_safe_zones());
    if a.grid() != b.grid() {
        return Some("safe zones");
    }
    if a.fill() != b.fill() {
        return Some("fill");
    }
    None
}

/// Verify that a bincode round trip preserves a region exactly.
#[must_use]
pub fn verify_serialization_determinism(region: &ComposedRegion) -> bool {
    let Ok(bytes) = region.to_bytes() else {
        return false;
    };
    let Ok(restored) = bincode::deserialize::<ComposedRegion>(&bytes) else {
        return false;
    };
    restored == *region && restored.fingerprint().ok() == region.fingerprint().ok()
}

/// Proptest strategies for composition inputs.
///
/// These strategies generate random but reproducible declarations for
/// property-based testing of layouts and regions.
pub mod strategies {
    use proptest::prelude::*;
    use wf_core::data::{Service, ServiceType, TownDefinition, TownSize};
    use wf_core::organism::{HamletConfig, HouseStyle};

    /// Any seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// A service type.
    pub fn arb_service_type() -> impl Strategy<Value = ServiceType> {
        prop_oneof![
            Just(ServiceType::Inn),
            Just(ServiceType::GeneralStore),
            Just(ServiceType::Blacksmith),
            Just(ServiceType::Temple),
            Just(ServiceType::Alchemist),
            Just(ServiceType::Stable),
            Just(ServiceType::Guild),
            Just(ServiceType::Market),
        ]
    }

    /// A town of up to six services and six houses, sized town or city.
    pub fn arb_town_definition() -> impl Strategy<Value = TownDefinition> {
        (
            prop_oneof![Just(TownSize::Village), Just(TownSize::Town), Just(TownSize::City)],
            prop::collection::vec(arb_service_type(), 0..6),
            0u32..6,
        )
            .prop_map(|(size, services, house_count)| TownDefinition {
                size,
                services: services
                    .into_iter()
                    .map(|kind| Service { kind, keeper: None })
                    .collect(),
                house_count,
                central_feature: None,
            })
    }

    /// A hamlet configuration with one to eight houses.
    pub fn arb_hamlet_config() -> impl Strategy<Value = HamletConfig> {
        (1u32..=8, any::<bool>()).prop_map(|(house_count, place_well)| HamletConfig {
            house_count,
            place_well,
            styles: vec![HouseStyle::Cottage, HouseStyle::Hut, HouseStyle::Farmhouse],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_verify_determinism_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            3,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 3);
    }

    #[test]
    fn test_fixture_world_is_deterministic() {
        verify_world_determinism(&fixtures::world_bundle(), &ComposeOptions::default(), 2)
            .assert_deterministic();
    }
}
