//! Composition benchmarks for wf_core.
//!
//! Run with: `cargo bench -p wf_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wf_core::archetype::ArchetypeRegistry;
use wf_core::biome::BiomeRegistry;
use wf_core::grid::{CollisionGrid, TileState};
use wf_core::math::TilePos;
use wf_core::region::{compose_region, RegionInputs};
use wf_core::router::find_path;
use wf_test_utils::fixtures;

/// A* across a 200x200 grid with a wall to go around.
pub fn routing_benchmark(c: &mut Criterion) {
    let mut grid = CollisionGrid::new(200, 200);
    grid.mark_area(100, 0, 2, 180, TileState::Blocked);
    c.bench_function("route_around_wall", |b| {
        b.iter(|| find_path(black_box(&grid), TilePos::new(5, 5), TilePos::new(195, 5), 3));
    });
}

/// The 45x45 town fixture.
pub fn town_benchmark(c: &mut Criterion) {
    c.bench_function("town_layout", |b| b.iter(|| black_box(fixtures::town_layout())));
}

/// A whole region, every phase.
pub fn region_benchmark(c: &mut Criterion) {
    let definition = fixtures::meadow_region();
    let biomes = BiomeRegistry::with_builtins();
    let archetypes = ArchetypeRegistry::new();
    let Ok(biome) = biomes.get(&definition.biome) else {
        return;
    };
    let inputs = RegionInputs {
        definition: &definition,
        biome,
        archetypes: &archetypes,
        exits: &[],
        seed: fixtures::FIXTURE_SEED,
    };
    c.bench_function("compose_region", |b| b.iter(|| black_box(compose_region(&inputs))));
}

criterion_group!(benches, routing_benchmark, town_benchmark, region_benchmark);
criterion_main!(benches);
