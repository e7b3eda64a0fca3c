//! Pluggable move selection for computer players.
//!
//! The engine never searches the game tree itself. A [`MoveChooser`] picks
//! one of the legal moves; stronger players are other implementations of the
//! same trait.

use crate::rules::get_legal_moves;
use crate::{AiDifficulty, Board, Mark, Position};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// Picks a move for `mark` on `board`.
pub trait MoveChooser: Send + Sync {
    /// Returns a legal position, or `None` when the board has no empty cell.
    fn choose(&self, board: &Board, mark: Mark, difficulty: AiDifficulty) -> Option<Position>;
}

/// Always plays the first empty cell in row-major order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstLegalMove;

impl MoveChooser for FirstLegalMove {
    fn choose(&self, board: &Board, _mark: Mark, _difficulty: AiDifficulty) -> Option<Position> {
        get_legal_moves(board).first().copied()
    }
}

/// Plays a uniformly random empty cell.
#[derive(Debug)]
pub struct RandomMove {
    rng: Mutex<StdRng>,
}

impl RandomMove {
    /// Chooser seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible chooser.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomMove {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveChooser for RandomMove {
    #[instrument(skip(self, board), fields(board = %board))]
    fn choose(&self, board: &Board, mark: Mark, difficulty: AiDifficulty) -> Option<Position> {
        let legal = get_legal_moves(board);
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let choice = legal.choose(&mut *rng).copied();
        debug!(?choice, options = legal.len(), "Random move chosen");
        choice
    }
}
