//! Local stencil evolver
//!
//! Pure Game of Life update over a flat, row-major `rows × cols` buffer with
//! toroidal wrap on both axes of the buffer it is given. Every read comes from
//! the previous generation and every write goes to a separate output, so the
//! update is strictly synchronous no matter how the rows are scheduled.
//!
//! The evolver knows nothing about distribution: whether a wrapped neighbour
//! row is real board data or a scratch artifact is the caller's business.

use crate::topology::wrap_index;
use rayon::prelude::*;
use std::ops::Range;

/// When to fan row updates out across the current rayon pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fanout {
    /// Fan out only when `rows * rows > cols`, so tiny edge evolutions stay serial
    #[default]
    Auto,

    /// Always fan out
    Always,

    /// Never fan out
    Never,
}

impl Fanout {
    /// Decide whether `rows` output rows of width `cols` are worth parallelising
    pub fn should_fan_out(self, rows: usize, cols: usize) -> bool {
        match self {
            Fanout::Auto => rows.saturating_mul(rows) > cols,
            Fanout::Always => true,
            Fanout::Never => false,
        }
    }
}

/// Count live cells among the 8 toroidal neighbours of `(i, j)`.
#[inline]
pub fn live_neighbours(src: &[bool], rows: usize, cols: usize, i: usize, j: usize) -> u8 {
    let mut count = 0;
    for di in -1isize..=1 {
        let r = wrap_index(i, di, rows) * cols;
        for dj in -1isize..=1 {
            if (di != 0 || dj != 0) && src[r + wrap_index(j, dj, cols)] {
                count += 1;
            }
        }
    }
    count
}

/// Next state of `(i, j)`: 2 neighbours keeps, 3 births, anything else dies.
#[inline]
pub fn next_state(src: &[bool], rows: usize, cols: usize, i: usize, j: usize) -> bool {
    match live_neighbours(src, rows, cols, i, j) {
        2 => src[i * cols + j],
        3 => true,
        _ => false,
    }
}

/// Evolve the rows in `range` of `src`, writing them densely into `out`.
///
/// `out` holds `range.len()` rows; `out[0..cols]` receives row `range.start`.
/// Neighbour rows outside `range` are still read from `src` (wrapping at
/// `rows`), which is what lets a caller evolve an interior band or a single
/// middle row of a scratch buffer without touching the rest.
///
/// # Panics
///
/// Panics if `src` is not `rows * cols` long, if `range` reaches past `rows`,
/// or if `out` is not `range.len() * cols` long.
pub fn evolve_rows(
    src: &[bool],
    rows: usize,
    cols: usize,
    range: Range<usize>,
    out: &mut [bool],
    fanout: Fanout,
) {
    assert_eq!(src.len(), rows * cols, "source buffer is not rows × cols");
    assert!(range.end <= rows, "row range {:?} exceeds {} rows", range, rows);
    assert_eq!(out.len(), range.len() * cols, "output buffer does not match row range");

    if range.is_empty() || cols == 0 {
        return;
    }

    let first = range.start;
    let update_row = |(offset, row): (usize, &mut [bool])| {
        let i = first + offset;
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = next_state(src, rows, cols, i, j);
        }
    };

    if fanout.should_fan_out(range.len(), cols) {
        out.par_chunks_mut(cols).enumerate().for_each(update_row);
    } else {
        out.chunks_mut(cols).enumerate().for_each(update_row);
    }
}

/// Produce the next generation of a whole buffer as a fresh buffer.
///
/// # Panics
///
/// Panics if `src` is not `rows * cols` long.
pub fn evolve(src: &[bool], rows: usize, cols: usize) -> Vec<bool> {
    let mut out = vec![false; rows * cols];
    evolve_rows(src, rows, cols, 0..rows, &mut out, Fanout::Auto);
    out
}

/// Evolve `board` through the caller's `temp` buffer and copy the result back.
///
/// # Panics
///
/// Panics if either buffer is not `rows * cols` long.
pub fn evolve_into_scratch(
    board: &mut [bool],
    temp: &mut [bool],
    rows: usize,
    cols: usize,
    fanout: Fanout,
) {
    evolve_rows(board, rows, cols, 0..rows, temp, fanout);
    board.copy_from_slice(temp);
}
