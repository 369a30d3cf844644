use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use parapply::{ApplyConfig, ParallelApplier};
use std::hint::black_box;
use std::time::Duration;

/// Deliberately CPU-heavy per-item work so batching overhead is visible
fn checksum(x: &u64) -> anyhow::Result<u64> {
    let mut acc = *x;
    for _ in 0..200 {
        acc = acc.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    }
    Ok(acc)
}

/// Compare batch sizes on a fixed workload
fn bench_batch_sizes(c: &mut Criterion) {
    let items: Vec<u64> = (0..50_000).collect();

    let mut group = c.benchmark_group("batch_size");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for batch_size in [16usize, 256, 1024, 8192] {
        let config = ApplyConfig::default()
            .with_progress(false)
            .with_batch_size(batch_size);
        let applier = match ParallelApplier::new(config) {
            Ok(applier) => applier,
            Err(e) => {
                println!("⚠️ Skipping batch size {batch_size}: {e}");
                continue;
            }
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &items,
            |b, items| b.iter(|| black_box(applier.run(items, checksum))),
        );
    }

    group.finish();
}

/// Sequential baseline for the same workload
fn bench_sequential_baseline(c: &mut Criterion) {
    let items: Vec<u64> = (0..50_000).collect();

    c.bench_function("sequential_baseline", |b| {
        b.iter(|| {
            let results: Vec<u64> = items.iter().filter_map(|x| checksum(x).ok()).collect();
            black_box(results)
        })
    });
}

criterion_group!(benches, bench_batch_sizes, bench_sequential_baseline);
criterion_main!(benches);
