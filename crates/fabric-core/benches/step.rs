use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fabric_core::{Fabric, FabricConfig, ManualClock, MemoryConfig, MemoryController, Pattern};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn wired_fabric(units: usize, fan_out: usize) -> Arc<Fabric> {
    let config = FabricConfig {
        max_units: units,
        ..FabricConfig::default()
    };
    let fabric = Fabric::with_clock(config, Arc::new(ManualClock::new(0.0))).unwrap();
    fabric.grow(units, "bench").unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    for source in 0..units {
        for _ in 0..fan_out {
            let target = rng.random_range(0..units);
            fabric.connect(source, target, rng.random_range(0.0..0.3));
        }
    }
    Arc::new(fabric)
}

fn bench_step(c: &mut Criterion) {
    let fabric = wired_fabric(5_000, 16);

    c.bench_function("step_idle_5k", |b| {
        b.iter(|| black_box(fabric.step()));
    });

    let active: Pattern = (0..250).collect();
    c.bench_function("step_active_250_of_5k", |b| {
        b.iter(|| {
            fabric.activate(&active, 1.2);
            black_box(fabric.step())
        });
    });
}

fn bench_maintenance(c: &mut Criterion) {
    let fabric = wired_fabric(2_000, 8);
    let config = MemoryConfig {
        consolidation_threshold: 1,
        ..MemoryConfig::default()
    };
    let memory = MemoryController::seeded(fabric, config, 42).unwrap();
    let pattern: Pattern = (100..140).collect();

    c.bench_function("consolidate_40_unit_pattern", |b| {
        b.iter(|| {
            memory.observe(pattern.clone());
            black_box(memory.consolidate())
        });
    });

    c.bench_function("prune_2k_fabric", |b| {
        b.iter(|| black_box(memory.prune(0.0, 1.0)));
    });
}

criterion_group!(benches, bench_step, bench_maintenance);
criterion_main!(benches);
