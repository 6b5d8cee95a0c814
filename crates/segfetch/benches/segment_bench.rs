use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use segfetch::core::plan_segments;
use std::hint::black_box;
use std::time::Duration;

fn bench_plan_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_segments");

    for file_size in [
        1024 * 1024,       // 1MB
        100 * 1024 * 1024, // 100MB
        10 * 1024 * 1024 * 1024, // 10GB
    ] {
        for num_segments in [1, 10, 64, 1024] {
            group.throughput(Throughput::Elements(u64::from(num_segments)));
            group.bench_with_input(
                BenchmarkId::new("file_size", format!("{file_size}_segments_{num_segments}")),
                &(file_size, num_segments),
                |b, &(file_size, num_segments)| {
                    b.iter(|| black_box(plan_segments(black_box(file_size), black_box(num_segments))));
                },
            );
        }
    }

    group.finish();
}

fn bench_plan_iteration(c: &mut Criterion) {
    let plan = plan_segments(100 * 1024 * 1024, 16).unwrap();

    c.bench_function("sum_segment_lengths", |b| {
        b.iter(|| black_box(plan.iter().map(|s| black_box(s.len())).sum::<u64>()));
    });
}

criterion_group!(
    name = segment_benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(20);
    targets = bench_plan_segments, bench_plan_iteration
);

criterion_main!(segment_benches);
