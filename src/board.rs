//! The global board
//!
//! A row-major toroidal grid of cells owned by the coordinator. It is handed
//! to [`RowPartitioner::distribute`](crate::partition::RowPartitioner::distribute)
//! by value and rebuilt by `collect`, so nothing holds it as a whole while
//! the generation loop runs.

use crate::error::{alloc_cells, Error, Result};
use crate::evolve::{evolve_into_scratch, Fanout};
use crate::topology::wrap_index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A `rows × cols` toroidal grid of cells
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Board {
    /// Create an all-dead board
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let cells = alloc_cells("global board", rows * cols)?;
        Ok(Self { rows, cols, cells })
    }

    /// Wrap an existing row-major cell buffer
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self> {
        if cells.len() != rows * cols {
            return Err(Error::InvalidConfig(format!(
                "{} cells cannot form a {}x{} board",
                cells.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Seed a board with each cell alive with probability 0.5
    pub fn random(rows: usize, cols: usize, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::random_with(rows, cols, &mut rng)
    }

    /// Seed a board from OS entropy
    pub fn random_from_entropy(rows: usize, cols: usize) -> Result<Self> {
        let mut rng = ChaCha8Rng::from_entropy();
        Self::random_with(rows, cols, &mut rng)
    }

    fn random_with<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Result<Self> {
        let mut board = Self::new(rows, cols)?;
        for cell in board.cells.iter_mut() {
            *cell = rng.gen_bool(0.5);
        }
        Ok(board)
    }

    /// Parse a picture where `#` or `O` is alive and anything else is dead.
    ///
    /// Blank lines are skipped; all remaining lines must be the same width.
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        let lines: Vec<&str> = pattern
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let rows = lines.len();
        let cols = lines.first().map_or(0, |l| l.chars().count());
        let mut cells = Vec::with_capacity(rows * cols);

        for (i, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(Error::InvalidConfig(format!(
                    "pattern line {} has {} cells, expected {}",
                    i, width, cols
                )));
            }
            cells.extend(line.chars().map(|c| c == '#' || c == 'O'));
        }

        Ok(Self { rows, cols, cells })
    }

    /// Stamp `pattern`'s live cells with its top-left corner at `(row, col)`,
    /// wrapping around the board edges
    pub fn place(&mut self, row: usize, col: usize, pattern: &Board) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "cannot place a pattern on an empty {}x{} board",
                self.rows, self.cols
            )));
        }
        for i in 0..pattern.rows {
            for j in 0..pattern.cols {
                if pattern.get(i, j) {
                    let r = wrap_index(row % self.rows, (i % self.rows) as isize, self.rows);
                    let c = wrap_index(col % self.cols, (j % self.cols) as isize, self.cols);
                    self.set(r, c, true);
                }
            }
        }
        Ok(())
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major cell buffer
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [bool] {
        &mut self.cells
    }

    /// One row of cells
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Cell at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.cols + col]
    }

    /// Set the cell at `(row, col)`
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        self.cells[row * self.cols + col] = alive;
    }

    /// Number of live cells
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Advance the whole board one generation as a single block
    pub fn step(&mut self) -> Result<()> {
        let mut temp = alloc_cells("board scratch", self.cells.len())?;
        evolve_into_scratch(&mut self.cells, &mut temp, self.rows, self.cols, Fanout::Auto);
        Ok(())
    }

    /// Advance the whole board `generations` times as a single block
    pub fn evolve(&mut self, generations: usize) -> Result<()> {
        let mut temp = alloc_cells("board scratch", self.cells.len())?;
        for _ in 0..generations {
            evolve_into_scratch(&mut self.cells, &mut temp, self.rows, self.cols, Fanout::Auto);
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.cols.max(1)) {
            for &cell in row {
                f.write_str(if cell { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {}x{} ({} alive)", self.rows, self.cols, self.population())?;
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pattern() {
        let board = Board::from_pattern(
            "
            .#.
            ..O
            ###
            ",
        )
        .unwrap();
        assert_eq!(board.rows(), 3);
        assert_eq!(board.cols(), 3);
        assert_eq!(board.population(), 5);
        assert!(board.get(1, 2));
        assert!(!board.get(0, 0));
    }

    #[test]
    fn test_ragged_pattern_rejected() {
        assert!(Board::from_pattern("##\n#").is_err());
    }

    #[test]
    fn test_from_cells_checks_length() {
        assert!(Board::from_cells(2, 2, vec![false; 3]).is_err());
        assert!(Board::from_cells(2, 2, vec![false; 4]).is_ok());
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = Board::random(16, 16, 42).unwrap();
        let b = Board::random(16, 16, 42).unwrap();
        let c = Board::random(16, 16, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        // 256 fair coin flips; far from either extreme.
        assert!(a.population() > 64 && a.population() < 192);
    }

    #[test]
    fn test_place_wraps() {
        let mut board = Board::new(4, 4).unwrap();
        let dot = Board::from_pattern("##\n##").unwrap();
        board.place(3, 3, &dot).unwrap();
        assert!(board.get(3, 3));
        assert!(board.get(3, 0));
        assert!(board.get(0, 3));
        assert!(board.get(0, 0));
        assert_eq!(board.population(), 4);
    }

    #[test]
    fn test_place_on_empty_board() {
        let dot = Board::from_pattern("#").unwrap();

        let mut no_rows = Board::new(0, 4).unwrap();
        assert!(matches!(no_rows.place(0, 0, &dot), Err(Error::InvalidConfig(_))));

        let mut no_cols = Board::from_pattern("").unwrap();
        assert!(matches!(no_cols.place(0, 0, &dot), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_step_blinker() {
        let mut board = Board::from_pattern(
            "
            .....
            .....
            .###.
            .....
            .....
            ",
        )
        .unwrap();
        let start = board.clone();
        board.step().unwrap();
        assert_ne!(board, start);
        board.step().unwrap();
        assert_eq!(board, start);
    }

    #[test]
    fn test_display_round_trips_pattern() {
        let text = ".#..\n..#.\n###.\n....\n";
        let board = Board::from_pattern(text).unwrap();
        assert_eq!(board.to_string(), text);
    }
}
