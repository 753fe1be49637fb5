//! Halo exchange protocol
//!
//! One pass per generation per worker:
//!
//! ```text
//!   post()          ship last row ↓ next, first row ↑ previous   (never blocks)
//!   prepare_edges   own rows into both scratch buffers
//!   evolve_interior useful work while the rows are in flight
//!   wait()          the only blocking point: both halos arrive
//!   evolve_edge ×2  middle row of each scratch buffer → block boundary
//! ```
//!
//! The ordering contract is carried by the types: edge evolution needs the
//! [`Halos`] that only [`PendingHalo::wait`] produces, while interior evolution
//! needs nothing from the network.

use crate::channel::{Backend, Channel, ChannelStats, Receiver, Sender};
use crate::error::{Error, Result};
use crate::message::{Direction, HaloEnvelope};
use crate::subboard::{Edge, SubBoard};
use crate::topology::{RingTopology, WorkerIndex};
use std::sync::Arc;
use tracing::trace;

/// Rows a neighbour can have in flight towards one worker in one direction.
///
/// A worker can post generation `g + 1` before its neighbour consumed `g`,
/// but cannot post `g + 2` until that neighbour has finished `g`.
pub const HALO_QUEUE_DEPTH: usize = 2;

/// One worker's four channel endpoints on the ring
pub struct HaloLink {
    worker: WorkerIndex,
    previous: WorkerIndex,
    next: WorkerIndex,
    to_previous: Sender<HaloEnvelope>,
    to_next: Sender<HaloEnvelope>,
    from_previous: Receiver<HaloEnvelope>,
    from_next: Receiver<HaloEnvelope>,
}

/// Halo rows moved by one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HaloTraffic {
    /// Rows this worker sent
    pub rows_sent: u64,

    /// Rows this worker received
    pub rows_received: u64,

    /// Failed sends and receives
    pub errors: u64,
}

impl HaloLink {
    /// Worker owning this link
    pub fn worker(&self) -> WorkerIndex {
        self.worker
    }

    /// Counters for this worker's side of the ring
    pub fn traffic(&self) -> HaloTraffic {
        let senders: [Arc<ChannelStats>; 2] = [self.to_previous.stats(), self.to_next.stats()];
        let receivers: [Arc<ChannelStats>; 2] =
            [self.from_previous.stats(), self.from_next.stats()];

        HaloTraffic {
            rows_sent: senders.iter().map(|s| s.sent()).sum(),
            rows_received: receivers.iter().map(|s| s.received()).sum(),
            errors: senders.iter().map(|s| s.send_errors()).sum::<u64>()
                + receivers.iter().map(|s| s.recv_errors()).sum::<u64>(),
        }
    }
}

/// Wire up a ring: one bounded channel per worker per direction.
///
/// Link `p` receives `p - 1`'s downward channel and `p + 1`'s upward channel.
/// With one worker every channel loops back to itself.
pub fn ring_links(ring: RingTopology, backend: Backend) -> Result<Vec<HaloLink>> {
    let workers = ring.workers();

    let mut down_tx = Vec::with_capacity(workers);
    let mut down_rx = Vec::with_capacity(workers);
    let mut up_tx = Vec::with_capacity(workers);
    let mut up_rx = Vec::with_capacity(workers);

    for _ in 0..workers {
        let (tx, rx) = Channel::bounded(backend, HALO_QUEUE_DEPTH);
        down_tx.push(Some(tx));
        down_rx.push(Some(rx));
        let (tx, rx) = Channel::bounded(backend, HALO_QUEUE_DEPTH);
        up_tx.push(Some(tx));
        up_rx.push(Some(rx));
    }

    let missing = |what: &str, p: WorkerIndex| {
        Error::Other(format!("{} endpoint for worker {} already taken", what, p))
    };

    (0..workers)
        .map(|p| -> Result<HaloLink> {
            let previous = ring.previous(p);
            let next = ring.next(p);
            Ok(HaloLink {
                worker: p,
                previous,
                next,
                to_previous: up_tx[p].take().ok_or_else(|| missing("upward sender", p))?,
                to_next: down_tx[p].take().ok_or_else(|| missing("downward sender", p))?,
                from_previous: down_rx[previous]
                    .take()
                    .ok_or_else(|| missing("downward receiver", previous))?,
                from_next: up_rx[next]
                    .take()
                    .ok_or_else(|| missing("upward receiver", next))?,
            })
        })
        .collect()
}

/// Both halo rows for one generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halos {
    /// Previous worker's last row, for the top scratch buffer
    pub above: Vec<bool>,

    /// Next worker's first row, for the bottom scratch buffer
    pub below: Vec<bool>,
}

/// Sends issued for a generation whose receives are still outstanding
#[must_use = "edge rows cannot be evolved until the halos are awaited"]
pub struct PendingHalo<'a> {
    link: &'a HaloLink,
    generation: u64,
}

impl PendingHalo<'_> {
    /// Generation these halos belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Block until both neighbours' rows for this generation arrive
    pub fn wait(self) -> Result<Halos> {
        let link = self.link;

        let above = accept(
            link.from_previous.recv()?,
            Direction::Down,
            link.previous,
            self.generation,
        )?;
        let below = accept(
            link.from_next.recv()?,
            Direction::Up,
            link.next,
            self.generation,
        )?;

        trace!(
            worker = link.worker,
            generation = self.generation,
            "halos received"
        );
        Ok(Halos { above, below })
    }
}

fn accept(
    envelope: HaloEnvelope,
    direction: Direction,
    source: WorkerIndex,
    generation: u64,
) -> Result<Vec<bool>> {
    if envelope.direction != direction
        || envelope.source != source
        || envelope.generation != generation
    {
        return Err(Error::ProtocolViolation(format!(
            "expected tag {} from worker {} for generation {}, got tag {} from worker {} for generation {}",
            direction.tag(),
            source,
            generation,
            envelope.direction.tag(),
            envelope.source,
            envelope.generation
        )));
    }
    Ok(envelope.row)
}

/// Per-worker protocol driver
pub struct HaloExchange {
    link: HaloLink,
    generation: u64,
}

impl HaloExchange {
    /// Drive the protocol over `link`, starting at generation 0
    pub fn new(link: HaloLink) -> Self {
        Self {
            link,
            generation: 0,
        }
    }

    /// Generations completed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Underlying link
    pub fn link(&self) -> &HaloLink {
        &self.link
    }

    /// Ship this block's boundary rows to both neighbours without blocking
    pub fn post(&self, sub: &SubBoard) -> Result<PendingHalo<'_>> {
        let link = &self.link;
        let generation = self.generation;

        let envelope = |edge: Edge, direction: Direction| {
            HaloEnvelope::new(sub.boundary_row(edge).to_vec(), direction)
                .with_source(link.worker)
                .with_generation(generation)
        };

        link.to_next
            .try_send(envelope(Edge::Bottom, Direction::Down))
            .map_err(|e| backpressure(e, link.next))?;
        link.to_previous
            .try_send(envelope(Edge::Top, Direction::Up))
            .map_err(|e| backpressure(e, link.previous))?;

        trace!(worker = link.worker, generation, "halos posted");
        Ok(PendingHalo { link, generation })
    }

    /// Run one full generation on `sub`
    pub fn step(&mut self, sub: &mut SubBoard) -> Result<()> {
        let pending = self.post(sub)?;

        sub.prepare_edges();
        sub.evolve_interior();

        let halos = pending.wait()?;
        sub.splice_halo(Edge::Top, &halos.above)?;
        sub.splice_halo(Edge::Bottom, &halos.below)?;
        sub.evolve_edge(Edge::Top)?;
        sub.evolve_edge(Edge::Bottom)?;

        self.generation += 1;
        Ok(())
    }
}

fn backpressure(err: Error, neighbour: WorkerIndex) -> Error {
    match err {
        Error::ChannelFull => Error::ProtocolViolation(format!(
            "worker {} has {} unread halo rows queued",
            neighbour, HALO_QUEUE_DEPTH
        )),
        other => other,
    }
}
