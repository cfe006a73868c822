use std::hint::black_box;

use criterion::{
    BenchmarkGroup, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
    measurement::WallTime,
};
use rand_aes::tls::rand_f32;
use simd_iir::{Cascade, Filter, IccMethod, Strategy};

const BUFFER_SIZE: usize = 4096;

/// Four stable sections, rows `[1, b1, b2, a1, a2]`.
const SECTIONS: [[f32; 5]; 4] = [
    [1.0, 0.1, -0.5, 0.2, 0.3],
    [1.0, 0.5, 0.785, 0.857_142_9, -0.408_163_3],
    [1.0, 0.0, 0.25, -0.2, -0.93],
    [1.0, -0.4, 0.25, 0.5, -0.4],
];

fn generate_white_noise(size: usize) -> Vec<f32> {
    (0..size).map(|_| rand_f32() * 2.0 - 1.0).collect()
}

fn bench_strategies<const W: usize>(group: &mut BenchmarkGroup<'_, WallTime>) {
    let strategies = [
        (Strategy::Scalar, "scalar"),
        (Strategy::Block, "block"),
        (Strategy::Mixed, "mixed"),
        (Strategy::MultiBlock, "multi-block"),
    ];

    for (strategy, name) in strategies {
        group.bench_with_input(
            BenchmarkId::new(name, format!("W={W}")),
            &strategy,
            |b, &strategy| {
                let mut filter =
                    Filter::<f32, W>::from_arrays(&SECTIONS, &[[0.0; 4]; 4], strategy).unwrap();
                let input = generate_white_noise(BUFFER_SIZE);
                let mut output = vec![0.0f32; BUFFER_SIZE];

                b.iter(|| {
                    let written = filter
                        .process(black_box(&input), black_box(&mut output))
                        .unwrap();
                    black_box(written);
                });
            },
        );
    }
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    group.throughput(Throughput::Bytes((BUFFER_SIZE * size_of::<f32>()) as u64));

    bench_strategies::<4>(&mut group);
    bench_strategies::<8>(&mut group);
    bench_strategies::<16>(&mut group);

    group.finish();
}

fn bench_icc_method<const W: usize>(group: &mut BenchmarkGroup<'_, WallTime>) {
    let methods = [
        (IccMethod::RecursiveDoubling, "recursive-doubling"),
        (IccMethod::RecursiveDoublingBroadcast, "recursive-doubling-broadcast"),
        (IccMethod::MatrixMultiply, "matrix-multiply"),
    ];

    for (method, name) in methods {
        group.bench_with_input(
            BenchmarkId::new(name, format!("W={W}")),
            &method,
            |b, &method| {
                let cascade = Cascade::<f32, W>::from_arrays(&SECTIONS, &[[0.0; 4]; 4])
                    .unwrap()
                    .with_icc_method(method);
                let mut filter = Filter::new(cascade, Strategy::MultiBlock);
                let mut data = generate_white_noise(BUFFER_SIZE);

                b.iter(|| {
                    black_box(filter.process_in_place(black_box(&mut data)));
                });
            },
        );
    }
}

fn bench_icc(c: &mut Criterion) {
    let mut group = c.benchmark_group("icc");
    group.throughput(Throughput::Bytes((BUFFER_SIZE * size_of::<f32>()) as u64));

    bench_icc_method::<4>(&mut group);
    bench_icc_method::<8>(&mut group);
    bench_icc_method::<16>(&mut group);

    group.finish();
}

criterion_group!(benches, bench_filter, bench_icc);
criterion_main!(benches);
