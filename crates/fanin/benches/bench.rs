use core::{hint::black_box, time::Duration};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use fanin::{Orchestrator, RunConfig, WorkerConfig};
use tokio::runtime::Builder;

const OPS_PER_WORKER: u32 = 1_000;

fn workers(count: usize) -> Vec<WorkerConfig> {
    (0..count)
        .map(|i| WorkerConfig::new(format!("W{i}"), OPS_PER_WORKER - 1, Duration::ZERO))
        .collect()
}

/// Full runs with no delays: measures spawn, multiplex, forward and drain.
fn bench_fan_in(c: &mut Criterion) {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();
    let mut group = c.benchmark_group("fan_in");

    for num_workers in [1, 4, 16, 64] {
        for buffer in [1, 64] {
            let total = num_workers as u64 * u64::from(OPS_PER_WORKER);
            group.throughput(Throughput::Elements(total));
            group.bench_function(
                format!("workers/{num_workers}/buffer/{buffer}"),
                |b| {
                    b.to_async(&rt).iter(|| async {
                        let config = RunConfig::default()
                            .with_seed(0)
                            .with_buffers(buffer, buffer);
                        let report = Orchestrator::with_workers(config, workers(num_workers))
                            .unwrap()
                            .run(std::io::sink())
                            .await
                            .unwrap();
                        black_box(report.forwarded);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_fan_in);
criterion_main!(benches);
