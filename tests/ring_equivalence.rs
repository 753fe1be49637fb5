//! The ring must evolve a board exactly as a single block would.

use halo_life::prelude::*;
use proptest::prelude::*;

const GLIDER: &str = "
.#.
..#
###
";

fn ring(rows: usize, cols: usize, workers: usize, generations: usize) -> RingPool {
    RingPool::new(
        RingConfig::new()
            .with_board(rows, cols)
            .with_workers(workers)
            .with_generations(generations)
            .with_threads_per_worker(2),
    )
    .unwrap()
}

fn reference(board: &Board, generations: usize) -> Board {
    let mut board = board.clone();
    board.evolve(generations).unwrap();
    board
}

#[test]
fn test_glider_crosses_block_boundary() {
    // Rows 2..5 straddle the boundary between the two 4-row blocks.
    let mut board = Board::new(8, 8).unwrap();
    board
        .place(2, 2, &Board::from_pattern(GLIDER).unwrap())
        .unwrap();

    let result = ring(8, 8, 2, 3).run(board.clone()).unwrap();
    let expected = reference(&board, 3);

    assert_eq!(result, expected);
    assert_eq!(result.population(), 5);
    assert!((0..8).any(|c| result.get(4, c)), "glider should occupy row 4");
    assert!((0..8).any(|c| result.get(3, c)), "glider should occupy row 3");
}

#[test]
fn test_glider_wraps_around_the_torus() {
    // Four generations move a glider one cell down-right; 32 bring it home.
    let mut board = Board::new(8, 8).unwrap();
    board
        .place(0, 0, &Board::from_pattern(GLIDER).unwrap())
        .unwrap();

    let result = ring(8, 8, 4, 32).run(board.clone()).unwrap();
    assert_eq!(result, board);
}

#[test]
fn test_blinker_on_seam_oscillates() {
    // Vertical blinker centred on the seam between blocks 1 and 2.
    let mut board = Board::new(8, 8).unwrap();
    for r in 2..5 {
        board.set(r, 4, true);
    }
    let once = ring(8, 8, 4, 1).run(board.clone()).unwrap();
    assert_ne!(once, board);
    assert!(once.get(3, 3) && once.get(3, 4) && once.get(3, 5));

    let twice = ring(8, 8, 4, 2).run(board.clone()).unwrap();
    assert_eq!(twice, board);
}

#[test]
fn test_block_still_life_on_wrap_seam() {
    // A block split across the last and first rows and columns.
    let mut board = Board::new(8, 8).unwrap();
    for (r, c) in [(7, 7), (7, 0), (0, 7), (0, 0)] {
        board.set(r, c, true);
    }
    let result = ring(8, 8, 2, 5).run(board.clone()).unwrap();
    assert_eq!(result, board);
}

#[test]
fn test_determinism() {
    let board = Board::random(32, 24, 99).unwrap();
    let pool = ring(32, 24, 4, 10);

    let first = pool.run(board.clone()).unwrap();
    let second = pool.run(Board::random(32, 24, 99).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_backends_agree() {
    let board = Board::random(24, 20, 5).unwrap();
    let expected = reference(&board, 6);

    for backend in [Backend::Flume, Backend::Crossbeam] {
        let pool = RingPool::new(
            RingConfig::new()
                .with_board(24, 20)
                .with_workers(3)
                .with_generations(6)
                .with_threads_per_worker(1)
                .with_backend(backend),
        )
        .unwrap();
        assert_eq!(pool.run(board.clone()).unwrap(), expected, "{:?}", backend);
    }
}

#[test]
fn test_fanout_policies_agree() {
    let board = Board::random(40, 16, 12).unwrap();
    let expected = reference(&board, 4);

    for fanout in [Fanout::Never, Fanout::Auto, Fanout::Always] {
        let pool = RingPool::new(
            RingConfig::new()
                .with_board(40, 16)
                .with_workers(2)
                .with_generations(4)
                .with_threads_per_worker(3)
                .with_fanout(fanout),
        )
        .unwrap();
        assert_eq!(pool.run(board.clone()).unwrap(), expected, "{:?}", fanout);
    }
}

#[test]
fn test_zero_generations_round_trips() {
    let board = Board::random(16, 16, 3).unwrap();
    assert_eq!(ring(16, 16, 4, 0).run(board.clone()).unwrap(), board);
}

#[test]
fn test_default_configuration() {
    let config = RingConfig::new().with_threads_per_worker(2);
    let board = Board::random(config.rows, config.cols, 2016).unwrap();
    let expected = reference(&board, config.generations);

    let pool = RingPool::new(config).unwrap();
    assert_eq!(pool.run(board).unwrap(), expected);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_ring_matches_single_block(
        workers in 1usize..5,
        half_block in 1usize..4,
        half_cols in 1usize..6,
        generations in 0usize..4,
        seed in any::<u64>(),
    ) {
        let rows = workers * half_block * 2;
        let cols = half_cols * 2;
        let board = Board::random(rows, cols, seed).unwrap();

        let result = ring(rows, cols, workers, generations).run(board.clone()).unwrap();
        prop_assert_eq!(result, reference(&board, generations));
    }
}
