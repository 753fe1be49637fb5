//! Toroidal index arithmetic and the worker ring
//!
//! The same wrap rule serves the row axis, the column axis and the ring of
//! workers, so it lives in exactly one place.

use crate::error::{Error, Result};

/// Index of worker in the ring (`0..workers`)
pub type WorkerIndex = usize;

/// Move `index` by `delta` positions on a cycle of length `modulus`.
///
/// `index` must already lie in `0..modulus`. `-1` from `0` lands on
/// `modulus - 1`, `+1` from `modulus - 1` lands on `0`.
#[inline]
pub fn wrap_index(index: usize, delta: isize, modulus: usize) -> usize {
    debug_assert!(modulus > 0 && index < modulus);
    let m = modulus as isize;
    (index as isize + delta).rem_euclid(m) as usize
}

/// Fixed ring of workers; worker `p` talks to `p - 1` and `p + 1` (mod P).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingTopology {
    workers: usize,
}

impl RingTopology {
    /// Create a ring of `workers` participants
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidConfig("a ring needs at least one worker".into()));
        }
        Ok(Self { workers })
    }

    /// Number of workers in the ring
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Neighbour that owns the rows directly above `worker`
    pub fn previous(&self, worker: WorkerIndex) -> WorkerIndex {
        wrap_index(worker, -1, self.workers)
    }

    /// Neighbour that owns the rows directly below `worker`
    pub fn next(&self, worker: WorkerIndex) -> WorkerIndex {
        wrap_index(worker, 1, self.workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_index_edges() {
        assert_eq!(wrap_index(0, -1, 8), 7);
        assert_eq!(wrap_index(7, 1, 8), 0);
        assert_eq!(wrap_index(3, 1, 8), 4);
        assert_eq!(wrap_index(3, -1, 8), 2);
        assert_eq!(wrap_index(0, 0, 1), 0);
        assert_eq!(wrap_index(0, -1, 1), 0);
        assert_eq!(wrap_index(2, 2, 3), 1);
    }

    #[test]
    fn test_ring_neighbours() {
        let ring = RingTopology::new(4).unwrap();
        assert_eq!(ring.previous(0), 3);
        assert_eq!(ring.next(3), 0);
        assert_eq!(ring.previous(2), 1);
        assert_eq!(ring.next(2), 3);
    }

    #[test]
    fn test_ring_of_one_is_its_own_neighbour() {
        let ring = RingTopology::new(1).unwrap();
        assert_eq!(ring.previous(0), 0);
        assert_eq!(ring.next(0), 0);
    }

    #[test]
    fn test_ring_of_two_shares_neighbour() {
        let ring = RingTopology::new(2).unwrap();
        assert_eq!(ring.previous(0), 1);
        assert_eq!(ring.next(0), 1);
    }

    #[test]
    fn test_empty_ring_rejected() {
        assert!(matches!(RingTopology::new(0), Err(Error::InvalidConfig(_))));
    }
}
