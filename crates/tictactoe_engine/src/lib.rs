//! Tic-tac-toe rules engine.
//!
//! Pure, synchronous game logic with no I/O:
//!
//! - [`Board`]: immutable 3x3 grid with a 9-character string codec
//! - [`rules`]: winner, status, legality and heuristic functions
//! - [`Game`]: the move-application state machine and its history
//! - [`GameSnapshot`]: the transport shape of a game
//! - [`MoveChooser`]: the seam for computer players
//!
//! # Example
//!
//! ```
//! use tictactoe_engine::{Game, GameMode, GameStatus, NewPlayer, PlayerId, Position};
//!
//! let mut game = Game::create(
//!     "demo",
//!     NewPlayer::named("alice", "Alice"),
//!     Some(NewPlayer::named("bob", "Bob")),
//!     GameMode::PvP,
//!     None,
//! )?;
//! let alice = PlayerId::new("alice")?;
//! game.play_move(Position::new(1, 1)?, &alice)?;
//! assert_eq!(game.board().to_string(), "....X....");
//! assert_eq!(game.status(), GameStatus::InProgress);
//! # Ok::<(), tictactoe_engine::GameError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod board;
mod chooser;
mod error;
mod game;
mod invariants;
mod player;
mod position;
pub mod rules;
mod snapshot;
mod types;

pub use action::Move;
pub use board::Board;
pub use chooser::{FirstLegalMove, MoveChooser, RandomMove};
pub use error::GameError;
pub use game::{Game, GameParts};
pub use invariants::{
    AlternatingTurnInvariant, BoardFillInvariant, GameInvariants, HistoryConsistentInvariant,
    Invariant, InvariantSet, InvariantViolation, StatusConsistentInvariant,
};
pub use player::{AI_PLAYER_ID, NewPlayer, Player, PlayerId};
pub use position::{BOARD_SIZE, CELL_COUNT, Position};
pub use snapshot::{BoardConfig, GameSnapshot, HistoryEntry, SnapshotStatus};
pub use types::{AiDifficulty, EMPTY_MARKER, GameMode, GameStatus, Mark};
