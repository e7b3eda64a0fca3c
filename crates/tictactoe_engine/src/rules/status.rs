//! Status derivation and move legality.

use super::win::calculate_winner;
use crate::position::CELL_COUNT;
use crate::{Board, GameStatus, Position};
use tracing::instrument;

/// Derives the status from the board and the number of moves played.
///
/// A completed line wins; otherwise nine moves is a draw. The result
/// depends on nothing but the two arguments.
#[instrument(skip(board), fields(board = %board))]
pub fn calculate_status(board: &Board, move_count: u32) -> GameStatus {
    match calculate_winner(board).and_then(GameStatus::won_by) {
        Some(won) => won,
        None if move_count as usize == CELL_COUNT => GameStatus::Draw,
        None => GameStatus::InProgress,
    }
}

/// True iff the cell at `position` is empty.
///
/// Turn order and finished games are the state machine's concern.
pub fn is_valid_move(board: &Board, position: Position) -> bool {
    board.is_empty(position)
}

/// Empty positions in row-major order.
///
/// Not suppressed for finished boards; callers with status context do that.
pub fn get_legal_moves(board: &Board) -> Vec<Position> {
    board.get_empty_positions()
}
