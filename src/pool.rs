//! Ring orchestration
//!
//! The pool takes ownership of the global board, cuts it into blocks, runs one
//! worker per block for a fixed number of generations and gathers the blocks
//! back into a board.

use crate::board::Board;
use crate::channel::Backend;
use crate::error::{Error, Result};
use crate::evolve::Fanout;
use crate::halo::{ring_links, HaloExchange};
use crate::partition::RowPartitioner;
use crate::subboard::SubBoard;
use crate::topology::RingTopology;
use crate::worker::{spawn, RingWorker, WorkerConfig, WorkerHandle, WorkerReport};
use crossbeam::sync::WaitGroup;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Half the side of the default board
pub const DIMENSION: usize = 400;

/// Default stencil threads inside each worker
pub const THREADS_PER_WORKER: usize = 8;

/// Ring run configuration
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Board rows
    pub rows: usize,

    /// Board columns
    pub cols: usize,

    /// Number of workers in the ring
    pub workers: usize,

    /// Generations to evolve
    pub generations: usize,

    /// Stencil threads inside each worker
    pub threads_per_worker: usize,

    /// Whether to pin worker threads to cores
    pub enable_cpu_affinity: bool,

    /// Halo transport backend
    pub backend: Backend,

    /// Stack size for worker threads (None = default)
    pub stack_size: Option<usize>,

    /// Fan-out policy for stencil updates
    pub fanout: Fanout,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            rows: 2 * DIMENSION,
            cols: 2 * DIMENSION,
            workers: 4,
            generations: 3,
            threads_per_worker: THREADS_PER_WORKER,
            enable_cpu_affinity: false,
            backend: Backend::default(),
            stack_size: None,
            fanout: Fanout::Auto,
        }
    }
}

impl RingConfig {
    /// Create a new ring configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the board size
    pub fn with_board(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Set the number of workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the number of generations
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Set the stencil threads per worker
    pub fn with_threads_per_worker(mut self, threads: usize) -> Self {
        self.threads_per_worker = threads;
        self
    }

    /// Enable CPU affinity pinning
    pub fn with_cpu_affinity(mut self, enable: bool) -> Self {
        self.enable_cpu_affinity = enable;
        self
    }

    /// Set the transport backend
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the worker stack size
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Set the fan-out policy
    pub fn with_fanout(mut self, fanout: Fanout) -> Self {
        self.fanout = fanout;
        self
    }

    /// Reject configurations the ring cannot run
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig("at least one worker is required".into()));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "board must be non-empty, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.rows % 2 != 0 || self.cols % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "board dimensions must be even, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.threads_per_worker == 0 {
            return Err(Error::InvalidConfig(
                "each worker needs at least one stencil thread".into(),
            ));
        }
        RowPartitioner::new(self.workers).block_rows(self.rows)?;
        Ok(())
    }

    fn worker_config(&self, worker: usize) -> WorkerConfig {
        let mut config = WorkerConfig::new()
            .with_name(format!("ring-worker-{}", worker))
            .with_threads(self.threads_per_worker)
            .with_fanout(self.fanout);

        if self.enable_cpu_affinity {
            config = config.with_cpu_affinity(worker % num_cpus::get());
        }
        if let Some(size) = self.stack_size {
            config = config.with_stack_size(size);
        }
        config
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per worker, in ring order
    pub workers: Vec<WorkerReport>,

    /// Wall time from distribution to collection
    pub elapsed: Duration,
}

impl RunReport {
    /// Halo rows sent across the whole ring
    pub fn rows_exchanged(&self) -> u64 {
        self.workers.iter().map(|w| w.traffic.rows_sent).sum()
    }
}

/// Drives a fixed-size ring of workers over one board
#[derive(Debug, Clone)]
pub struct RingPool {
    config: RingConfig,
}

impl RingPool {
    /// Create a pool, rejecting invalid configurations up front
    pub fn new(config: RingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Pool configuration
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Evolve `board` for the configured number of generations
    pub fn run(&self, board: Board) -> Result<Board> {
        self.run_with_report(board).map(|(board, _)| board)
    }

    /// Evolve `board` and report per-worker traffic and timing
    pub fn run_with_report(&self, board: Board) -> Result<(Board, RunReport)> {
        let config = &self.config;
        if board.rows() != config.rows || board.cols() != config.cols {
            return Err(Error::InvalidConfig(format!(
                "board is {}x{}, pool configured for {}x{}",
                board.rows(),
                board.cols(),
                config.rows,
                config.cols
            )));
        }

        info!(
            rows = config.rows,
            cols = config.cols,
            workers = config.workers,
            generations = config.generations,
            backend = ?config.backend,
            "starting ring run"
        );
        let started = Instant::now();

        let partitioner = RowPartitioner::new(config.workers);
        let blocks = partitioner.distribute(board)?;
        let links = ring_links(RingTopology::new(config.workers)?, config.backend)?;

        let generations = config.generations;
        let workers = blocks
            .into_iter()
            .zip(links)
            .map(|(sub, link)| RingWorker::new(sub, HaloExchange::new(link), generations));
        let (finished, reports) = self.launch(workers)?;

        let board = partitioner.collect(finished)?;
        let report = RunReport {
            workers: reports,
            elapsed: started.elapsed(),
        };

        info!(
            population = board.population(),
            rows_exchanged = report.rows_exchanged(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "ring run finished"
        );
        Ok((board, report))
    }

    /// Spawn every worker behind one start barrier and join them all.
    ///
    /// If a worker cannot be started, the workers already running are still
    /// joined; the endpoints of the missing ones are dropped by then, so they
    /// fail out of their first exchange instead of waiting forever.
    fn launch<I>(&self, workers: I) -> Result<(Vec<SubBoard>, Vec<WorkerReport>)>
    where
        I: IntoIterator<Item = Result<RingWorker>>,
    {
        let start = WaitGroup::new();
        let mut handles: Vec<WorkerHandle> = Vec::with_capacity(self.config.workers);
        let mut first_error = None;
        for worker in workers {
            let spawned = worker.and_then(|worker| {
                let index = worker.index();
                spawn(worker, self.config.worker_config(index), start.clone())
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(started = handles.len(), error = %e, "failed to start ring worker");
                    first_error = Some(e);
                    break;
                }
            }
        }
        start.wait();

        let mut finished = Vec::with_capacity(handles.len());
        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let index = handle.index();
            match handle.join() {
                Ok((sub, report)) => {
                    finished.push(sub);
                    reports.push(report);
                }
                Err(e) => {
                    error!(worker = index, error = %e, "ring run failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok((finished, reports)),
        }
    }
}
