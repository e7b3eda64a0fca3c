//! Immutable 3x3 board.

use crate::error::GameError;
use crate::position::{BOARD_SIZE, CELL_COUNT, Position};
use crate::types::Mark;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// 3x3 tic-tac-toe board.
///
/// Every cell is always populated (`Mark::Empty` counts). Placing a mark
/// returns a new board; the original is never changed.
///
/// Serializes as the 9-character row-major string, `.` for empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Board {
    cells: [Mark; CELL_COUNT],
}

impl Board {
    /// Board with all nine cells empty.
    pub fn empty() -> Self {
        Self {
            cells: [Mark::Empty; CELL_COUNT],
        }
    }

    /// Mark at `position`.
    pub fn get_cell(&self, position: Position) -> Mark {
        self.cells[position.to_index()]
    }

    /// True iff the cell at `position` is empty.
    pub fn is_empty(&self, position: Position) -> bool {
        self.get_cell(position).is_empty()
    }

    /// Returns a new board with `mark` placed at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CellOccupied`] if the cell is not empty; `self`
    /// is untouched either way.
    #[instrument(skip(self), fields(board = %self))]
    pub fn with_mark(&self, position: Position, mark: Mark) -> Result<Self, GameError> {
        if !self.is_empty(position) {
            return Err(GameError::CellOccupied(position));
        }
        let mut cells = self.cells;
        cells[position.to_index()] = mark;
        Ok(Self { cells })
    }

    /// Empty positions in row-major order.
    pub fn get_empty_positions(&self) -> Vec<Position> {
        Position::all().filter(|pos| self.is_empty(*pos)).collect()
    }

    /// True iff no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|mark| !mark.is_empty())
    }

    /// Number of cells holding `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|cell| **cell == mark).count()
    }

    /// The board as a grid of rows.
    pub fn rows(&self) -> [[Mark; BOARD_SIZE]; BOARD_SIZE] {
        let mut rows = [[Mark::Empty; BOARD_SIZE]; BOARD_SIZE];
        for pos in Position::all() {
            rows[pos.row()][pos.col()] = self.get_cell(pos);
        }
        rows
    }

    /// Multi-line rendering for logs and terminals.
    pub fn display(&self) -> String {
        self.rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|mark| mark.as_char().to_string())
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect::<Vec<_>>()
            .join("\n-+-+-\n")
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for mark in &self.cells {
            write!(f, "{}", mark.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != CELL_COUNT {
            return Err(GameError::malformed(
                s,
                format!("expected {} characters, got {}", CELL_COUNT, chars.len()),
            ));
        }

        let mut cells = [Mark::Empty; CELL_COUNT];
        for (index, c) in chars.into_iter().enumerate() {
            cells[index] = Mark::from_char(c).ok_or_else(|| {
                GameError::malformed(s, format!("invalid character {:?} at index {}", c, index))
            })?;
        }
        Ok(Self { cells })
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}

impl TryFrom<String> for Board {
    type Error = GameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
