//! Per-worker storage: the owned row-block and its edge scratch buffers
//!
//! Each worker owns one contiguous block of board rows plus two `3 × cols`
//! scratch buffers. The top buffer holds `[halo from previous, own first,
//! own second]` and the bottom buffer holds `[own second-to-last, own last,
//! halo from next]`. Only the middle row of an evolved scratch buffer is real:
//! its outer rows wrap onto each other inside a 3-row torus and are never
//! written back.

use crate::board::Board;
use crate::error::{alloc_cells, Error, Result};
use crate::evolve::{evolve_rows, Fanout};
use crate::topology::WorkerIndex;
use std::ops::Range;

/// Which edge of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The block's first row, bordering the previous worker
    Top,

    /// The block's last row, bordering the next worker
    Bottom,
}

/// A `3 × cols` buffer used to evolve one boundary row with real neighbour data
#[derive(Debug, Clone)]
pub struct EdgeBuffer {
    cols: usize,
    cells: Vec<bool>,
}

impl EdgeBuffer {
    /// Rows in a scratch buffer
    pub const ROWS: usize = 3;

    /// The only row whose evolved value is kept
    pub const MIDDLE: usize = 1;

    fn new(cols: usize) -> Result<Self> {
        let cells = alloc_cells("edge scratch buffer", Self::ROWS * cols)?;
        Ok(Self { cols, cells })
    }

    /// Slot that receives the neighbour's halo row
    pub fn halo_slot(edge: Edge) -> usize {
        match edge {
            Edge::Top => 0,
            Edge::Bottom => 2,
        }
    }

    /// Raw `3 × cols` cells
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// One row of the buffer
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// One row of the buffer, mutably
    pub fn row_mut(&mut self, row: usize) -> &mut [bool] {
        &mut self.cells[row * self.cols..(row + 1) * self.cols]
    }
}

/// One worker's exclusive block of the global board
#[derive(Debug, Clone)]
pub struct SubBoard {
    index: WorkerIndex,
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
    next: Vec<bool>,
    top: EdgeBuffer,
    bottom: EdgeBuffer,
    edge_out: Vec<bool>,
    fanout: Fanout,
}

impl SubBoard {
    /// Allocate an all-dead block of `rows × cols` for worker `index`
    pub fn new(index: WorkerIndex, rows: usize, cols: usize) -> Result<Self> {
        if rows < 2 {
            return Err(Error::InvalidConfig(format!(
                "a block needs at least 2 rows to fill its edge buffers, got {}",
                rows
            )));
        }

        Ok(Self {
            index,
            rows,
            cols,
            cells: alloc_cells("sub-board", rows * cols)?,
            next: alloc_cells("sub-board scratch", rows * cols)?,
            top: EdgeBuffer::new(cols)?,
            bottom: EdgeBuffer::new(cols)?,
            edge_out: alloc_cells("edge result row", cols)?,
            fanout: Fanout::Auto,
        })
    }

    /// Set the fan-out policy used for interior and edge evolution
    pub fn with_fanout(mut self, fanout: Fanout) -> Self {
        self.fanout = fanout;
        self
    }

    /// Owning worker
    pub fn index(&self) -> WorkerIndex {
        self.index
    }

    /// Rows in this block
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Columns in this block
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major cells of the block
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Global rows covered by this block
    pub fn global_rows(&self) -> Range<usize> {
        let start = self.index * self.rows;
        start..start + self.rows
    }

    fn check_shape(&self, board: &Board) -> Result<()> {
        if board.cols() != self.cols || self.global_rows().end > board.rows() {
            return Err(Error::PartitionError(format!(
                "block {} ({} rows x {} cols) does not fit a {}x{} board",
                self.index,
                self.rows,
                self.cols,
                board.rows(),
                board.cols()
            )));
        }
        Ok(())
    }

    /// Copy this worker's row range out of the global board
    pub fn load_from_global(&mut self, board: &Board) -> Result<()> {
        self.check_shape(board)?;
        let range = self.global_rows();
        self.cells
            .copy_from_slice(&board.cells()[range.start * self.cols..range.end * self.cols]);
        Ok(())
    }

    /// Write this worker's row range back into the global board
    pub fn store_to_global(&self, board: &mut Board) -> Result<()> {
        self.check_shape(board)?;
        let range = self.global_rows();
        let cols = self.cols;
        board.cells_mut()[range.start * cols..range.end * cols].copy_from_slice(&self.cells);
        Ok(())
    }

    fn row_span(&self, row: usize) -> Range<usize> {
        row * self.cols..(row + 1) * self.cols
    }

    fn boundary_index(&self, edge: Edge) -> usize {
        match edge {
            Edge::Top => 0,
            Edge::Bottom => self.rows - 1,
        }
    }

    /// The row shipped to the neighbour on `edge`
    pub fn boundary_row(&self, edge: Edge) -> &[bool] {
        &self.cells[self.row_span(self.boundary_index(edge))]
    }

    /// Scratch buffer for `edge`
    pub fn scratch(&self, edge: Edge) -> &EdgeBuffer {
        match edge {
            Edge::Top => &self.top,
            Edge::Bottom => &self.bottom,
        }
    }

    /// Scratch buffer for `edge`, mutably
    pub fn scratch_mut(&mut self, edge: Edge) -> &mut EdgeBuffer {
        match edge {
            Edge::Top => &mut self.top,
            Edge::Bottom => &mut self.bottom,
        }
    }

    /// Copy the block's own two rows on each edge into the scratch buffers.
    ///
    /// Must run before the interior is evolved; the halo slots are left as
    /// they were.
    pub fn prepare_edges(&mut self) {
        let cols = self.cols;
        let tail = (self.rows - 2) * cols;

        self.top.cells[cols..3 * cols].copy_from_slice(&self.cells[..2 * cols]);
        self.bottom.cells[..2 * cols].copy_from_slice(&self.cells[tail..]);
    }

    /// Drop a neighbour's row into the halo slot of `edge`'s scratch buffer,
    /// completing the buffer started by [`prepare_edges`](Self::prepare_edges)
    pub fn splice_halo(&mut self, edge: Edge, neighbour_row: &[bool]) -> Result<()> {
        if neighbour_row.len() != self.cols {
            return Err(Error::ProtocolViolation(format!(
                "halo row has {} cells, expected {}",
                neighbour_row.len(),
                self.cols
            )));
        }
        let slot = EdgeBuffer::halo_slot(edge);
        self.scratch_mut(edge).row_mut(slot).copy_from_slice(neighbour_row);
        Ok(())
    }

    /// Overwrite the true boundary row on `edge` with an evolved middle row
    pub fn apply_edge_result(&mut self, edge: Edge, new_middle_row: &[bool]) -> Result<()> {
        if new_middle_row.len() != self.cols {
            return Err(Error::ProtocolViolation(format!(
                "edge result has {} cells, expected {}",
                new_middle_row.len(),
                self.cols
            )));
        }
        let span = self.row_span(self.boundary_index(edge));
        self.cells[span].copy_from_slice(new_middle_row);
        Ok(())
    }

    /// Evolve every row that has both neighbours inside the block.
    ///
    /// The two boundary rows keep their previous-generation value until
    /// [`evolve_edge`](Self::evolve_edge) replaces them.
    pub fn evolve_interior(&mut self) {
        if self.rows <= 2 {
            return;
        }
        let cols = self.cols;
        let interior = 1..self.rows - 1;
        let span = interior.start * cols..interior.end * cols;

        evolve_rows(
            &self.cells,
            self.rows,
            cols,
            interior,
            &mut self.next[span.clone()],
            self.fanout,
        );
        self.cells[span.clone()].copy_from_slice(&self.next[span]);
    }

    /// Evolve `edge`'s scratch buffer and keep only its middle row
    pub fn evolve_edge(&mut self, edge: Edge) -> Result<()> {
        let scratch = match edge {
            Edge::Top => &self.top,
            Edge::Bottom => &self.bottom,
        };
        evolve_rows(
            scratch.cells(),
            EdgeBuffer::ROWS,
            self.cols,
            EdgeBuffer::MIDDLE..EdgeBuffer::MIDDLE + 1,
            &mut self.edge_out,
            self.fanout,
        );

        let row = std::mem::take(&mut self.edge_out);
        let applied = self.apply_edge_result(edge, &row);
        self.edge_out = row;
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolve::evolve;

    fn numbered_board(rows: usize, cols: usize) -> Board {
        let cells = (0..rows * cols).map(|i| (i * 5 + i / 3) % 4 == 0).collect();
        Board::from_cells(rows, cols, cells).unwrap()
    }

    #[test]
    fn test_load_and_store_round_trip() {
        let board = numbered_board(8, 6);
        let mut sub = SubBoard::new(1, 4, 6).unwrap();
        sub.load_from_global(&board).unwrap();
        assert_eq!(sub.global_rows(), 4..8);
        assert_eq!(sub.cells(), &board.cells()[24..48]);

        let mut target = Board::new(8, 6).unwrap();
        sub.store_to_global(&mut target).unwrap();
        assert_eq!(&target.cells()[24..48], sub.cells());
        assert!(target.cells()[..24].iter().all(|&c| !c));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let board = numbered_board(8, 6);
        let mut sub = SubBoard::new(2, 4, 6).unwrap();
        assert!(matches!(
            sub.load_from_global(&board),
            Err(Error::PartitionError(_))
        ));
    }

    #[test]
    fn test_single_row_block_rejected() {
        assert!(matches!(SubBoard::new(0, 1, 4), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_boundary_rows() {
        let board = numbered_board(4, 5);
        let mut sub = SubBoard::new(0, 4, 5).unwrap();
        sub.load_from_global(&board).unwrap();
        assert_eq!(sub.boundary_row(Edge::Top), board.row(0));
        assert_eq!(sub.boundary_row(Edge::Bottom), board.row(3));
    }

    #[test]
    fn test_scratch_layout() {
        let board = numbered_board(6, 4);
        let mut sub = SubBoard::new(0, 6, 4).unwrap();
        sub.load_from_global(&board).unwrap();

        let above = [true, false, true, false];
        let below = [false, true, true, true];
        sub.prepare_edges();
        sub.splice_halo(Edge::Top, &above).unwrap();
        sub.splice_halo(Edge::Bottom, &below).unwrap();

        let top = sub.scratch(Edge::Top);
        assert_eq!(top.row(0), &above);
        assert_eq!(top.row(1), board.row(0));
        assert_eq!(top.row(2), board.row(1));

        let bottom = sub.scratch(Edge::Bottom);
        assert_eq!(bottom.row(0), board.row(4));
        assert_eq!(bottom.row(1), board.row(5));
        assert_eq!(bottom.row(2), &below);
    }

    #[test]
    fn test_wrong_halo_width_rejected() {
        let mut sub = SubBoard::new(0, 2, 4).unwrap();
        assert!(matches!(
            sub.splice_halo(Edge::Top, &[true; 3]),
            Err(Error::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_apply_edge_result_touches_only_boundary() {
        let board = numbered_board(4, 4);
        let mut sub = SubBoard::new(0, 4, 4).unwrap();
        sub.load_from_global(&board).unwrap();

        sub.apply_edge_result(Edge::Bottom, &[true; 4]).unwrap();
        assert_eq!(&sub.cells()[..12], &board.cells()[..12]);
        assert_eq!(sub.boundary_row(Edge::Bottom), &[true; 4]);
    }

    #[test]
    fn test_single_block_step_matches_torus() {
        // A lone worker is its own neighbour: its halos are its own edge rows.
        let board = numbered_board(6, 7);
        let expected = evolve(board.cells(), 6, 7);

        let mut sub = SubBoard::new(0, 6, 7).unwrap();
        sub.load_from_global(&board).unwrap();
        let last = sub.boundary_row(Edge::Bottom).to_vec();
        let first = sub.boundary_row(Edge::Top).to_vec();

        sub.prepare_edges();
        sub.evolve_interior();
        sub.splice_halo(Edge::Top, &last).unwrap();
        sub.splice_halo(Edge::Bottom, &first).unwrap();
        sub.evolve_edge(Edge::Top).unwrap();
        sub.evolve_edge(Edge::Bottom).unwrap();

        assert_eq!(sub.cells(), &expected[..]);
    }

    #[test]
    fn test_two_row_block_has_no_interior() {
        let board = numbered_board(2, 5);
        let mut sub = SubBoard::new(0, 2, 5).unwrap();
        sub.load_from_global(&board).unwrap();
        sub.evolve_interior();
        assert_eq!(sub.cells(), board.cells());
    }
}
