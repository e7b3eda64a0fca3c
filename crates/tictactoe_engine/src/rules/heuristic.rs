//! Terminal-outcome scoring.

use crate::{GameStatus, Mark};

/// Scores `status` from `for_player`'s point of view.
///
/// `1.0` when `for_player` won, `-1.0` when the opponent won, `0.0` for a
/// draw or a game still in progress. No board lookahead.
pub fn calculate_heuristic(status: GameStatus, for_player: Mark) -> f64 {
    match status.winner() {
        Some(winner) if winner == for_player => 1.0,
        Some(_) => -1.0,
        None => 0.0,
    }
}
