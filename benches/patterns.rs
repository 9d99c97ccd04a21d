//! Benchmarks for the CPU side: pattern generation, normalization and
//! transition blending.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cosmic_backdrop::field::FieldSystem;
use cosmic_backdrop::normalize::normalize;
use cosmic_backdrop::pattern::Pattern;
use cosmic_backdrop::transition::TransitionController;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for pattern in Pattern::ALL {
        for count in [1_000usize, 15_000] {
            group.bench_with_input(BenchmarkId::new(pattern.name(), count), &count, |b, &count| {
                let mut rng = StdRng::seed_from_u64(7);
                b.iter(|| black_box(pattern.generate(count, 70.0, &mut rng)))
            });
        }
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let points: Vec<Vec3> = (0..15_000)
        .map(|_| Vec3::new(rng.gen_range(-40.0..40.0), rng.gen_range(-5.0..5.0), rng.gen_range(-90.0..90.0)))
        .collect();

    c.bench_function("normalize_15k", |b| {
        b.iter_batched(
            || points.clone(),
            |mut p| {
                normalize(&mut p, 70.0);
                black_box(p)
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_transition_frame(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let mut field = FieldSystem::particles(15_000, &mut rng);
    // Slow enough that the transition never finishes while measuring.
    let mut controller = TransitionController::new(1e-9, 70.0, 3);
    controller.seed(&mut field);
    controller.request_next_pattern(&field);

    c.bench_function("transition_advance_15k", |b| {
        b.iter(|| black_box(controller.advance(&mut field)))
    });
}

criterion_group!(benches, bench_generate, bench_normalize, bench_transition_frame);
criterion_main!(benches);
