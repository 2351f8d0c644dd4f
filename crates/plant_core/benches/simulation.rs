//! Simulation benchmarks for plant_core.
//!
//! Run with: `cargo bench -p plant_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use plant_core::plant::{Plant, PlantInputs, PlantSpec};

/// Benchmarks a full tick of a default plant under steady operator input.
pub fn simulation_benchmark(c: &mut Criterion) {
    let inputs = PlantInputs {
        rod_percentage: Some(40),
        water_pumped_in: 250,
        condenser_water_delta: 0,
    };

    c.bench_function("plant_tick", |b| {
        let mut plant = Plant::new(PlantSpec::default());
        b.iter(|| {
            let report = plant.step(black_box(inputs));
            black_box(report)
        })
    });

    c.bench_function("plant_tick_1000", |b| {
        b.iter(|| {
            let mut plant = Plant::new(PlantSpec::default());
            for _ in 0..1000 {
                let _ = plant.step(black_box(inputs));
            }
            black_box(plant.state_hash())
        })
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
