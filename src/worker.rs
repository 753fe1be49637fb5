//! Ring workers
//!
//! Each worker is an isolated thread that owns one block of the board and its
//! four halo channel endpoints. It shares no memory with other workers; the
//! only cross-worker traffic is the halo exchange. Inside a worker, stencil
//! updates fan out across a private rayon pool.

use crate::error::{Error, Result};
use crate::evolve::Fanout;
use crate::halo::{HaloExchange, HaloTraffic};
use crate::subboard::SubBoard;
use crate::topology::WorkerIndex;
use crossbeam::sync::WaitGroup;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker name (for debugging/monitoring)
    pub name: Option<String>,

    /// CPU core to pin this worker to (None = no pinning)
    pub cpu_affinity: Option<usize>,

    /// Stack size for worker thread (None = default)
    pub stack_size: Option<usize>,

    /// Threads in the worker's stencil pool
    pub threads: usize,

    /// Fan-out policy for stencil updates
    pub fanout: Fanout,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: None,
            cpu_affinity: None,
            stack_size: None,
            threads: 1,
            fanout: Fanout::Auto,
        }
    }
}

impl WorkerConfig {
    /// Create a new worker configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set CPU affinity
    pub fn with_cpu_affinity(mut self, cpu: usize) -> Self {
        self.cpu_affinity = Some(cpu);
        self
    }

    /// Set stack size
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Set the stencil pool size
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the fan-out policy
    pub fn with_fanout(mut self, fanout: Fanout) -> Self {
        self.fanout = fanout;
        self
    }
}

/// What a worker did during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker index in the ring
    pub worker: WorkerIndex,

    /// Generations completed
    pub generations: u64,

    /// Halo rows moved
    pub traffic: HaloTraffic,

    /// Wall time from the start barrier to the last generation
    pub elapsed: Duration,
}

/// A block plus the protocol state needed to evolve it
pub struct RingWorker {
    sub: SubBoard,
    exchange: HaloExchange,
    generations: usize,
}

impl RingWorker {
    /// Pair a block with its ring link for a fixed number of generations
    pub fn new(sub: SubBoard, exchange: HaloExchange, generations: usize) -> Result<Self> {
        if sub.index() != exchange.link().worker() {
            return Err(Error::Other(format!(
                "block {} paired with ring link of worker {}",
                sub.index(),
                exchange.link().worker()
            )));
        }
        Ok(Self {
            sub,
            exchange,
            generations,
        })
    }

    /// Index of this worker in the ring
    pub fn index(&self) -> WorkerIndex {
        self.sub.index()
    }

    /// Run every generation on the calling thread
    pub fn run(mut self) -> Result<(SubBoard, WorkerReport)> {
        let started = Instant::now();
        for _ in 0..self.generations {
            self.exchange.step(&mut self.sub)?;
        }

        let report = WorkerReport {
            worker: self.sub.index(),
            generations: self.exchange.generation(),
            traffic: self.exchange.link().traffic(),
            elapsed: started.elapsed(),
        };
        Ok((self.sub, report))
    }
}

/// Handle to a running worker thread
pub struct WorkerHandle {
    index: WorkerIndex,
    thread_handle: Option<JoinHandle<Result<(SubBoard, WorkerReport)>>>,
}

impl WorkerHandle {
    /// Worker index in the ring
    pub fn index(&self) -> WorkerIndex {
        self.index
    }

    /// Wait for the worker to finish and take back its block
    pub fn join(mut self) -> Result<(SubBoard, WorkerReport)> {
        let handle = self
            .thread_handle
            .take()
            .ok_or_else(|| Error::Other(format!("worker {} already joined", self.index)))?;

        handle.join().map_err(|panic| {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Worker thread panicked".to_string());
            Error::WorkerPanicked(format!("worker {}: {}", self.index, msg))
        })?
    }
}

/// Spawn `worker` on its own thread.
///
/// The thread pins itself, builds its stencil pool, then waits on `start`
/// so that no generation begins before every block has been handed out.
pub fn spawn(worker: RingWorker, config: WorkerConfig, start: WaitGroup) -> Result<WorkerHandle> {
    let index = worker.index();

    let mut thread_builder = thread::Builder::new();

    if let Some(name) = &config.name {
        thread_builder = thread_builder.name(name.clone());
    } else {
        thread_builder = thread_builder.name(format!("ring-worker-{}", index));
    }

    if let Some(stack_size) = config.stack_size {
        thread_builder = thread_builder.stack_size(stack_size);
    }

    let thread_handle = thread_builder
        .spawn(move || {
            // Set CPU affinity if specified
            if let Some(cpu) = config.cpu_affinity {
                if let Some(core_ids) = core_affinity::get_core_ids() {
                    if cpu < core_ids.len() {
                        core_affinity::set_for_current(core_ids[cpu]);
                    }
                }
            }

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(move |i| format!("ring-worker-{}-stencil-{}", index, i))
                .build()
                .map_err(|e| Error::Other(format!("Failed to build stencil pool: {}", e)));

            start.wait();
            let pool = pool?;

            debug!(worker = index, threads = config.threads, "worker started");
            let worker = RingWorker {
                sub: worker.sub.with_fanout(config.fanout),
                ..worker
            };

            match pool.install(move || worker.run()) {
                Ok((sub, report)) => {
                    debug!(
                        worker = index,
                        generations = report.generations,
                        rows_sent = report.traffic.rows_sent,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "worker finished"
                    );
                    Ok((sub, report))
                }
                Err(e) => {
                    error!(worker = index, error = %e, "worker aborted");
                    Err(e)
                }
            }
        })
        .map_err(|e| Error::Other(format!("Failed to spawn worker thread: {}", e)))?;

    Ok(WorkerHandle {
        index,
        thread_handle: Some(thread_handle),
    })
}
