//! Errors raised by the board, rules and game state machine.

use crate::player::PlayerId;
use crate::position::Position;

/// Every way a tic-tac-toe operation can be rejected.
///
/// All of these are raised synchronously and never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// Row or column outside `0..3`.
    #[display("Position out of bounds: ({}, {})", row, col)]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// Linear index outside `0..9`.
    #[display("Index out of bounds: {}", _0)]
    IndexOutOfBounds(usize),

    /// The target cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(Position),

    /// The game reached a terminal status.
    #[display("Game is already finished")]
    GameAlreadyFinished,

    /// The acting player does not own the mark due to move.
    #[display("It's {}'s turn (got {})", expected, actual)]
    WrongTurn {
        /// Player bound to the mark due to move.
        expected: PlayerId,
        /// Player who attempted the move.
        actual: PlayerId,
    },

    /// Board string of the wrong length or with an unknown character.
    #[display("Malformed board string {:?}: {}", input, reason)]
    MalformedSerialization {
        /// The rejected input.
        input: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Player ids were empty or blank.
    #[display("Invalid player id {:?}", _0)]
    InvalidPlayerId(String),

    /// Mode and players do not fit together.
    #[display("Invalid game setup: {}", _0)]
    InvalidSetup(String),

    /// Restored parts violate a game invariant.
    #[display("Inconsistent game state: {}", _0)]
    InconsistentState(String),
}

impl std::error::Error for GameError {}

impl GameError {
    /// Builds a [`GameError::MalformedSerialization`].
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSerialization {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
