//! Benchmarks for novelty archive scoring.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

use novelty_archive::{
    ArchiveConfig, DispersionMethod, NoveltyArchive, NoveltyItem,
    compute::{component_weights, weighted_euclidean},
};

fn random_item(rng: &mut StdRng) -> NoveltyItem {
    NoveltyItem::from_descriptor((0..4).map(|_| rng.gen_range(-10.0..10.0)).collect())
}

fn filled_archive(size: usize, rng: &mut StdRng) -> NoveltyArchive {
    let mut archive: NoveltyArchive =
        NoveltyArchive::with_distance(ArchiveConfig::default(), weighted_euclidean).unwrap();
    for _ in 0..size {
        archive.admit(random_item(rng), false);
    }
    archive
}

fn bench_test_novelty(c: &mut Criterion) {
    let mut group = c.benchmark_group("test_novelty");
    let mut rng = StdRng::seed_from_u64(7);

    for size in [16, 64, 256, 1024] {
        let mut archive = filled_archive(size, &mut rng);
        let mut query = random_item(&mut rng);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| archive.test_novelty(black_box(&mut query)));
        });
    }

    group.finish();
}

fn bench_test_fitness(c: &mut Criterion) {
    let mut group = c.benchmark_group("test_fitness");
    let mut rng = StdRng::seed_from_u64(11);

    for size in [16, 64, 256, 1024] {
        let mut archive = filled_archive(size, &mut rng);
        let mut query = random_item(&mut rng);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| archive.test_fitness(black_box(&mut query)));
        });
    }

    group.finish();
}

fn bench_score_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_candidates");
    let mut rng = StdRng::seed_from_u64(13);

    for size in [64, 256, 1024] {
        let mut archive = filled_archive(size, &mut rng);
        let mut candidates: Vec<NoveltyItem> = (0..100).map(|_| random_item(&mut rng)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| archive.score_candidates(black_box(&mut candidates), 15));
        });
    }

    group.finish();
}

fn bench_component_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("component_weights");
    let mut rng = StdRng::seed_from_u64(17);
    let items: Vec<NoveltyItem> = (0..1024).map(|_| random_item(&mut rng)).collect();

    for method in DispersionMethod::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", method)),
            &method,
            |b, &method| {
                b.iter(|| {
                    component_weights(black_box(items.iter().map(NoveltyItem::descriptor)), 4, method)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_test_novelty,
    bench_test_fitness,
    bench_score_candidates,
    bench_component_weights
);
criterion_main!(benches);
