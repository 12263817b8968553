//! Cost of probe round trips on the simulated platform.
//!
//! This measures the host simulation itself (thread hand-off, interrupt
//! model, register locks), which bounds the smallest latency the simulated
//! platform can report.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use amp_latency::sim::SimPlatform;
use amp_latency::LatencyProbe;

const ROUND_TRIPS: usize = 100;
const SETTLE: Duration = Duration::from_secs(1);

fn bench_shmem(c: &mut Criterion) {
    let platform = SimPlatform::new().expect("platform");
    let peripherals = platform.peripherals().expect("peripherals");

    let mut runs = 0;
    let mut group = c.benchmark_group("shmem_round_trip");
    group.throughput(Throughput::Elements(ROUND_TRIPS as u64));
    for size in [16usize, 256, 1024] {
        let probe = LatencyProbe::new()
            .sizes(vec![size])
            .iterations(ROUND_TRIPS)
            .preflight(false);
        group.bench_with_input(BenchmarkId::from_parameter(size), &probe, |b, probe| {
            b.iter(|| {
                let report = probe.shmem_latency(&peripherals).expect("run");
                runs += 1;
                // The next run must not race the remote's handling of this run's final kick.
                assert!(platform.wait_finished(runs, SETTLE));
                black_box(report)
            })
        });
    }
    group.finish();
}

fn bench_ipi(c: &mut Criterion) {
    let platform = SimPlatform::new().expect("platform");
    let peripherals = platform.peripherals().expect("peripherals");
    let probe = LatencyProbe::new()
        .iterations(ROUND_TRIPS)
        .preflight(false);

    let mut runs = 0;
    let mut group = c.benchmark_group("ipi_round_trip");
    group.throughput(Throughput::Elements(ROUND_TRIPS as u64));
    group.bench_function("kick", |b| {
        b.iter(|| {
            let report = probe.ipi_latency(&peripherals).expect("run");
            runs += 1;
            assert!(platform.wait_finished(runs, SETTLE));
            black_box(report)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_shmem, bench_ipi);
criterion_main!(benches);
