//! Simulation benchmarks for swarm_core.
//!
//! Run with: `cargo bench -p swarm_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use swarm_core::config::SimConfig;
use swarm_core::math::Fixed;
use swarm_core::scenario::ScenarioConfig;
use swarm_core::simulation::Simulation;

fn skirmish(seed: u64) -> Simulation {
    let scenario = ScenarioConfig::with_seed(seed);
    match Simulation::skirmish(SimConfig::default(), &scenario) {
        Ok(sim) => sim,
        Err(e) => panic!("benchmark scenario failed to build: {e}"),
    }
}

/// Warm a skirmish up so drones are fighting before measuring.
fn warmed_skirmish(seed: u64, seconds: i32) -> Simulation {
    let mut sim = skirmish(seed);
    let dt = Fixed::ONE / Fixed::from_num(60);
    for _ in 0..seconds * 60 {
        sim.tick(dt);
    }
    sim
}

pub fn simulation_benchmark(c: &mut Criterion) {
    let dt = Fixed::ONE / Fixed::from_num(60);

    c.bench_function("build_skirmish", |b| b.iter(|| black_box(skirmish(black_box(7)))));

    let warmed = warmed_skirmish(7, 60);
    c.bench_function("tick_60hz_after_warmup", |b| {
        b.iter_batched(
            || warmed.clone(),
            |mut sim| black_box(sim.tick(dt)),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("state_hash", |b| b.iter(|| black_box(warmed.state_hash())));

    c.bench_function("hud_capture", |b| b.iter(|| black_box(warmed.hud())));
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
