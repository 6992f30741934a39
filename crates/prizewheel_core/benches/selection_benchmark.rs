//! Benchmark for draw and spin planning.
//!
//! TARGET: 1,000,000 draws per second
//!
//! Run with: cargo bench --package prizewheel_core --bench selection_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use prizewheel_core::{
    default_segments, select_index, RotationConfig, RotationPlanner, Segment, SegmentSet,
    SelectionEngine,
};

fn create_wide_wheel() -> SegmentSet {
    let segments = (0..64)
        .map(|i| Segment::new(format!("slot-{i}"), f64::from(i % 7 + 1), ""))
        .collect();
    SegmentSet::new(segments).unwrap()
}

fn benchmark_single_select(c: &mut Criterion) {
    let set = SegmentSet::new(default_segments()).unwrap();

    c.bench_function("single_select", |b| {
        let mut unit = 0.0f64;
        b.iter(|| {
            unit = (unit + 0.618_033_988_75) % 1.0;
            black_box(select_index(black_box(&set), black_box(unit)))
        });
    });
}

fn benchmark_million_draws(c: &mut Criterion) {
    let set = create_wide_wheel();
    let mut engine = SelectionEngine::from_seed(1);

    let mut group = c.benchmark_group("million_draws");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);

    group.bench_function("1M_draws_64_segments", |b| {
        b.iter(|| {
            for _ in 0..1_000_000u32 {
                black_box(engine.draw(&set));
            }
        });
    });

    group.finish();
}

fn benchmark_plan(c: &mut Criterion) {
    let set = create_wide_wheel();
    let planner = RotationPlanner::new(RotationConfig::default()).unwrap();
    let mut engine = SelectionEngine::from_seed(2);

    c.bench_function("draw_and_plan", |b| {
        let mut angle = 0.0;
        b.iter(|| {
            let (index, _) = engine.draw(&set);
            let plan = planner
                .plan(&set, index, angle, engine.rng_mut())
                .unwrap();
            angle = plan.target_angle;
            black_box(plan)
        });
    });
}

fn benchmark_statistics(c: &mut Criterion) {
    let set = SegmentSet::new(default_segments()).unwrap();
    let mut engine = SelectionEngine::from_seed(3);

    c.bench_function("statistics_100k", |b| {
        b.iter(|| black_box(engine.run_statistics(black_box(&set), black_box(100_000))));
    });
}

criterion_group!(
    benches,
    benchmark_single_select,
    benchmark_million_draws,
    benchmark_plan,
    benchmark_statistics
);
criterion_main!(benches);
