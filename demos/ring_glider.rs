//! A glider crossing block boundaries on an 8x8 board split over two workers

use halo_life::prelude::*;
use tracing_subscriber::EnvFilter;

const GLIDER: &str = "
.#.
..#
###
";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Ring Glider ===\n");

    let mut board = Board::new(8, 8)?;
    board.place(1, 1, &Board::from_pattern(GLIDER)?)?;
    println!("Generation 0:\n{}", board);

    let pool = RingPool::new(
        RingConfig::new()
            .with_board(8, 8)
            .with_workers(2)
            .with_generations(1)
            .with_threads_per_worker(1),
    )?;

    let mut reference = board.clone();
    for generation in 1..=8 {
        board = pool.run(board)?;
        reference.step()?;
        println!("Generation {}:\n{}", generation, board);
        assert_eq!(board, reference, "ring diverged from single-block evolution");
    }

    println!("Ring result matches single-block evolution.");
    Ok(())
}
