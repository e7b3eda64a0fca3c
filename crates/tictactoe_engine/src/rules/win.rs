//! Win detection logic for tic-tac-toe.

use crate::{Board, Mark, Position};
use tracing::instrument;

const fn at(row: usize, col: usize) -> Position {
    // Only called with literals in 0..3 below.
    match Position::from_parts(row, col) {
        Some(pos) => pos,
        None => panic!("winning line coordinate out of range"),
    }
}

/// The eight winning lines: rows, then columns, then diagonals.
pub const WIN_LINES: [[Position; 3]; 8] = [
    // Rows
    [at(0, 0), at(0, 1), at(0, 2)],
    [at(1, 0), at(1, 1), at(1, 2)],
    [at(2, 0), at(2, 1), at(2, 2)],
    // Columns
    [at(0, 0), at(1, 0), at(2, 0)],
    [at(0, 1), at(1, 1), at(2, 1)],
    [at(0, 2), at(1, 2), at(2, 2)],
    // Diagonals
    [at(0, 0), at(1, 1), at(2, 2)],
    [at(0, 2), at(1, 1), at(2, 0)],
];

/// Returns the mark holding all three cells of the first complete line.
///
/// Lines are checked in [`WIN_LINES`] order. A malformed board with several
/// complete lines reports the first one found.
#[instrument(skip(board), fields(board = %board))]
pub fn calculate_winner(board: &Board) -> Option<Mark> {
    for [a, b, c] in WIN_LINES {
        let mark = board.get_cell(a);
        if !mark.is_empty() && mark == board.get_cell(b) && mark == board.get_cell(c) {
            return Some(mark);
        }
    }
    None
}
