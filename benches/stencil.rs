//! Benchmarks for the local stencil evolver

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use halo_life::evolve::{evolve_rows, Fanout};
use halo_life::Board;

fn bench_evolve_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("evolve_block");

    for side in [64usize, 256, 800].iter() {
        let board = Board::random(*side, *side, 1).unwrap();
        let mut out = vec![false; side * side];
        group.throughput(Throughput::Elements((side * side) as u64));

        for fanout in [Fanout::Never, Fanout::Auto] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", fanout), side),
                side,
                |b, &side| {
                    b.iter(|| {
                        evolve_rows(
                            black_box(board.cells()),
                            side,
                            side,
                            0..side,
                            &mut out,
                            fanout,
                        );
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_edge_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_row");

    for cols in [100usize, 800, 4000].iter() {
        let scratch = Board::random(3, *cols, 2).unwrap();
        let mut out = vec![false; *cols];
        group.throughput(Throughput::Elements(*cols as u64));

        group.bench_with_input(BenchmarkId::from_parameter(cols), cols, |b, &cols| {
            b.iter(|| {
                evolve_rows(
                    black_box(scratch.cells()),
                    3,
                    cols,
                    1..2,
                    &mut out,
                    Fanout::Auto,
                );
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evolve_block, bench_edge_row);

criterion_main!(benches);
