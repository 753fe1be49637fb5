//! Halo messages exchanged between ring neighbours

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::topology::WorkerIndex;

/// Direction a halo row travels around the ring; doubles as the message tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Direction {
    /// A worker's last row, sent to the next worker (lands in its top halo)
    Down,

    /// A worker's first row, sent to the previous worker (lands in its bottom halo)
    Up,
}

impl Direction {
    /// Fixed wire tag for this direction
    pub const fn tag(self) -> u8 {
        match self {
            Direction::Down => 0,
            Direction::Up => 1,
        }
    }
}

/// One boundary row in flight between ring neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct HaloEnvelope {
    /// The row's cells
    pub row: Vec<bool>,

    /// Tag identifying which boundary this row is
    pub direction: Direction,

    /// Sending worker
    pub source: WorkerIndex,

    /// Generation the row belongs to (the state *before* that generation's update)
    pub generation: u64,
}

impl HaloEnvelope {
    /// Create a new envelope with the given row
    pub fn new(row: Vec<bool>, direction: Direction) -> Self {
        Self {
            row,
            direction,
            source: 0,
            generation: 0,
        }
    }

    /// Set the source worker
    pub fn with_source(mut self, source: WorkerIndex) -> Self {
        self.source = source;
        self
    }

    /// Set the generation
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}
