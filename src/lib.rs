//! # Halo Life
//!
//! Conway's Game of Life on a toroidal board that is too big for one worker,
//! split into contiguous row-blocks across a fixed ring of shared-nothing
//! workers.
//!
//! ## Key Features
//!
//! - **Zero-sharing by design**: each worker owns its block exclusively
//! - **Halo exchange**: boundary rows travel between ring neighbours once per generation
//! - **Latency hiding**: interior rows evolve while halo rows are in flight
//! - **Two levels of parallelism**: workers on threads, stencil rows on a per-worker rayon pool
//! - **Exact**: the distributed result equals evolving the whole board in one block
//!
//! ## Architecture
//!
//! ```text
//!            last row ↓                          last row ↓
//! ┌─────────────┐ ──────────> ┌─────────────┐ ──────────> ┌─────────────┐
//! │  Worker 0   │             │  Worker 1   │             │  Worker 2   │
//! │ rows 0..n   │ <────────── │ rows n..2n  │ <────────── │ rows 2n..3n │
//! └─────────────┘ first row ↑ └─────────────┘ first row ↑ └─────────────┘
//!        ▲                                                       │
//!        └──────────────── ring wraps around ────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use halo_life::prelude::*;
//!
//! let config = RingConfig::new()
//!     .with_board(64, 64)
//!     .with_workers(4)
//!     .with_generations(10);
//! let pool = RingPool::new(config)?;
//! let board = Board::random(64, 64, 42)?;
//! let evolved = pool.run(board)?;
//! println!("{}", evolved.population());
//! # Ok::<(), halo_life::Error>(())
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod board;
pub mod channel;
pub mod error;
pub mod evolve;
pub mod halo;
pub mod message;
pub mod partition;
pub mod pool;
pub mod subboard;
pub mod topology;
pub mod worker;

// Re-exports
pub use board::Board;
pub use channel::{Backend, Channel, ChannelStats, Receiver, Sender};
pub use error::{Error, Result};
pub use evolve::{evolve, evolve_into_scratch, evolve_rows, Fanout};
pub use halo::{ring_links, HaloExchange, HaloLink, HaloTraffic, Halos, PendingHalo};
pub use message::{Direction, HaloEnvelope};
pub use partition::RowPartitioner;
pub use pool::{RingConfig, RingPool, RunReport};
pub use subboard::{Edge, EdgeBuffer, SubBoard};
pub use topology::{wrap_index, RingTopology, WorkerIndex};
pub use worker::{RingWorker, WorkerConfig, WorkerReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::board::Board;
    pub use crate::channel::Backend;
    pub use crate::error::{Error, Result};
    pub use crate::evolve::Fanout;
    pub use crate::partition::RowPartitioner;
    pub use crate::pool::{RingConfig, RingPool, RunReport};
    pub use crate::subboard::{Edge, SubBoard};
}
