//! Row-block partitioning of the global board
//!
//! The board is cut into `P` equal runs of contiguous rows; worker `p` gets
//! rows `p * R/P .. (p + 1) * R/P`. Distribution consumes the board and
//! collection rebuilds it, so ownership of the whole board passes from the
//! coordinator to the workers and back.

use crate::board::Board;
use crate::error::{Error, Result};
use crate::subboard::SubBoard;
use crate::topology::WorkerIndex;
use std::ops::Range;

/// Equal contiguous row-block partitioner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartitioner {
    workers: usize,
}

impl RowPartitioner {
    /// Create a partitioner for `workers` blocks
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    /// Number of blocks
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Rows per block for a board of `rows` rows.
    ///
    /// Uneven splits are rejected rather than padded.
    pub fn block_rows(&self, rows: usize) -> Result<usize> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig("at least one worker is required".into()));
        }
        if rows % self.workers != 0 {
            return Err(Error::InvalidConfig(format!(
                "rows ({}) not divisible by workers ({})",
                rows, self.workers
            )));
        }
        let block = rows / self.workers;
        if block < 2 {
            return Err(Error::InvalidConfig(format!(
                "{} rows over {} workers leaves {} row(s) per block, need at least 2",
                rows, self.workers, block
            )));
        }
        Ok(block)
    }

    /// Global rows owned by `worker`
    pub fn block_range(&self, rows: usize, worker: WorkerIndex) -> Result<Range<usize>> {
        let block = self.block_rows(rows)?;
        if worker >= self.workers {
            return Err(Error::PartitionError(format!(
                "worker {} out of range for {} workers",
                worker, self.workers
            )));
        }
        Ok(worker * block..(worker + 1) * block)
    }

    /// Split `board` into one block per worker, in worker order
    pub fn distribute(&self, board: Board) -> Result<Vec<SubBoard>> {
        let block = self.block_rows(board.rows())?;

        (0..self.workers)
            .map(|p| -> Result<SubBoard> {
                let mut sub = SubBoard::new(p, block, board.cols())?;
                sub.load_from_global(&board)?;
                Ok(sub)
            })
            .collect()
    }

    /// Reassemble a board from every worker's final block.
    ///
    /// Blocks may arrive in any order but each worker must appear exactly once.
    pub fn collect(&self, blocks: Vec<SubBoard>) -> Result<Board> {
        if blocks.len() != self.workers {
            return Err(Error::PartitionError(format!(
                "expected {} blocks, got {}",
                self.workers,
                blocks.len()
            )));
        }

        let first = blocks
            .first()
            .ok_or_else(|| Error::PartitionError("no blocks to collect".into()))?;
        let (block_rows, cols) = (first.rows(), first.cols());

        let mut seen = vec![false; self.workers];
        for sub in &blocks {
            if sub.rows() != block_rows || sub.cols() != cols {
                return Err(Error::PartitionError(format!(
                    "block {} is {}x{}, expected {}x{}",
                    sub.index(),
                    sub.rows(),
                    sub.cols(),
                    block_rows,
                    cols
                )));
            }
            match seen.get_mut(sub.index()) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(Error::PartitionError(format!(
                        "block {} is duplicated or out of range",
                        sub.index()
                    )))
                }
            }
        }

        let mut board = Board::new(block_rows * self.workers, cols)?;
        for sub in &blocks {
            sub.store_to_global(&mut board)?;
        }
        Ok(board)
    }
}
