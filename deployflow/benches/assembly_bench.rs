//! Benchmarks for pipeline assembly.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deployflow::prelude::*;

fn assembly_benchmark(c: &mut Criterion) {
    let config = container_delivery(&ContainerDeliveryParams::new(
        "BenchPipeline",
        "octo",
        "app",
        "arn:example:connection/1",
    ));

    c.bench_function("assemble_container_delivery", |b| {
        b.iter(|| assemble(black_box(&config)))
    });

    c.bench_function("fingerprint", |b| {
        let pipeline = assemble(&config).unwrap();
        b.iter(|| black_box(&pipeline).fingerprint())
    });
}

criterion_group!(benches, assembly_benchmark);
criterion_main!(benches);
