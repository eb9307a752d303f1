use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use config_facade::{ConfigFactory, MapConfigMap, Property};
use std::sync::Arc;

/// 创建 benchmark 用的配置，包含 n 个 key
fn create_benchmark_map(n: usize) -> MapConfigMap {
    (0..n)
        .map(|i| (format!("service.node{}.port", i), (8000 + i) as i64))
        .collect()
}

fn benchmark_property_reads(c: &mut Criterion) {
    let config = ConfigFactory::from_map(&create_benchmark_map(100));
    let live = config.get_integer("service.node42.port");
    let cached = live.cache();
    let chained = config
        .get_integer("service.missing.port")
        .or([live.clone()]);

    let mut group = c.benchmark_group("property_read");

    group.bench_function("live", |b| b.iter(|| black_box(live.get().unwrap())));
    group.bench_function("cached", |b| b.iter(|| black_box(cached.get().unwrap())));
    group.bench_function("chained", |b| b.iter(|| black_box(chained.get().unwrap())));
    group.bench_function("static", |b| {
        let fixed = Property::of(8042);
        b.iter(|| black_box(fixed.get().unwrap()))
    });

    group.finish();
}

fn benchmark_path_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_view");

    for size in [10, 100, 1000].iter() {
        let config = ConfigFactory::from_map(&create_benchmark_map(*size));
        group.bench_with_input(BenchmarkId::new("get_keys", size), size, |b, _| {
            let service = config.at_path("service").unwrap();
            b.iter(|| black_box(service.get_keys()))
        });
    }

    let config = ConfigFactory::from_map(&create_benchmark_map(100));
    group.bench_function("at_path", |b| {
        b.iter(|| black_box(config.at_path(black_box("service.node1")).unwrap()))
    });

    group.finish();
}

fn benchmark_replace(c: &mut Criterion) {
    let config = ConfigFactory::from_map(&create_benchmark_map(100));
    let cached: Vec<_> = (0..100)
        .map(|i| config.get_integer(&format!("service.node{}.port", i)).cache())
        .collect();
    let next: Arc<MapConfigMap> = Arc::new(create_benchmark_map(100));

    c.bench_function("replace_with_100_cached_properties", |b| {
        b.iter(|| {
            config.replace(next.clone());
            black_box(cached[0].get().unwrap())
        })
    });
}

criterion_group!(
    benches,
    benchmark_property_reads,
    benchmark_path_views,
    benchmark_replace
);
criterion_main!(benches);
