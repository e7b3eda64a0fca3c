//! Validated coordinates on the 3x3 board.

use crate::error::GameError;
use serde::Serialize;

/// Number of rows and columns.
pub const BOARD_SIZE: usize = 3;

/// Number of cells.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// A `(row, col)` coordinate, both in `0..3`.
///
/// Out-of-range coordinates are rejected at construction, so a `Position`
/// can always index the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    /// Creates a position.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if `row` or `col` is not below 3.
    pub fn new(row: usize, col: usize) -> Result<Self, GameError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(GameError::OutOfBounds { row, col });
        }
        Ok(Self { row, col })
    }

    /// Const constructor for tables built at compile time.
    pub(crate) const fn from_parts(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Creates a position from its row-major index.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IndexOutOfBounds`] for indices of 9 or more.
    pub fn from_index(index: usize) -> Result<Self, GameError> {
        if index >= CELL_COUNT {
            return Err(GameError::IndexOutOfBounds(index));
        }
        Ok(Self {
            row: index / BOARD_SIZE,
            col: index % BOARD_SIZE,
        })
    }

    /// Row-major index (`row * 3 + col`).
    pub fn to_index(self) -> usize {
        self.row * BOARD_SIZE + self.col
    }

    /// Row, `0..3`.
    pub fn row(self) -> usize {
        self.row
    }

    /// Column, `0..3`.
    pub fn col(self) -> usize {
        self.col
    }

    /// All nine positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..CELL_COUNT).map(|index| Position {
            row: index / BOARD_SIZE,
            col: index % BOARD_SIZE,
        })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl TryFrom<(usize, usize)> for Position {
    type Error = GameError;

    fn try_from((row, col): (usize, usize)) -> Result<Self, Self::Error> {
        Position::new(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_rejected() {
        assert_eq!(
            Position::new(3, 0),
            Err(GameError::OutOfBounds { row: 3, col: 0 })
        );
        assert!(Position::new(0, 3).is_err());
        assert!(Position::new(2, 2).is_ok());
    }

    #[test]
    fn test_index_round_trip() {
        for index in 0..CELL_COUNT {
            let pos = Position::from_index(index).unwrap();
            assert_eq!(pos.to_index(), index);
        }
        assert_eq!(Position::from_index(9), Err(GameError::IndexOutOfBounds(9)));
    }

    #[test]
    fn test_all_is_row_major() {
        let all: Vec<_> = Position::all().collect();
        assert_eq!(all.len(), 9);
        assert_eq!(all[0], Position::new(0, 0).unwrap());
        assert_eq!(all[1], Position::new(0, 1).unwrap());
        assert_eq!(all[3], Position::new(1, 0).unwrap());
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }
}
