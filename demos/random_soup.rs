//! Random soup on the default 800x800 board, four workers, three generations

use halo_life::prelude::*;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2016);

    let config = RingConfig::new().with_threads_per_worker(2);
    let board = Board::random(config.rows, config.cols, seed)?;
    println!(
        "Seed {}: {}x{} board, {} alive",
        seed,
        board.rows(),
        board.cols(),
        board.population()
    );

    let mut serial = board.clone();
    let serial_start = Instant::now();
    serial.evolve(config.generations)?;
    let serial_time = serial_start.elapsed();

    let pool = RingPool::new(config)?;
    let (ring, report) = pool.run_with_report(board)?;

    println!("Serial:   {:?}", serial_time);
    println!("Ring:     {:?} ({} halo rows)", report.elapsed, report.rows_exchanged());
    for worker in &report.workers {
        println!(
            "  worker {}: {} generations, {} rows out, {} rows in, {:?}",
            worker.worker,
            worker.generations,
            worker.traffic.rows_sent,
            worker.traffic.rows_received,
            worker.elapsed
        );
    }
    println!("Final population: {}", ring.population());
    println!("Matches serial: {}", ring == serial);

    Ok(())
}
