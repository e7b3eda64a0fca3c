//! Transport shape of a game's state.
//!
//! This is what collaborators log, persist for analytics, and send to the
//! platform. Shape:
//!
//! ```json
//! {
//!   "game_id": "…",
//!   "board": [["X", ".", "."], [".", "O", "."], [".", ".", "."]],
//!   "current_player": "X",
//!   "legal_moves": [1, 2, 3, 5, 6, 7, 8],
//!   "move_count": 2,
//!   "game_status": "IN_PROGRESS",
//!   "winner": null,
//!   "config": {"rows": 3, "cols": 3},
//!   "history": [{"player": "X", "move_index": 0}, {"player": "O", "move_index": 4}],
//!   "last_updated": "2024-05-01T12:00:00Z"
//! }
//! ```

use crate::position::BOARD_SIZE;
use crate::{Game, GameStatus, Mark};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse status tag; the winner is carried separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    /// Game still running.
    InProgress,
    /// Game ended without a winner.
    Draw,
    /// Someone won; see `winner`.
    Win,
}

impl From<GameStatus> for SnapshotStatus {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::InProgress => SnapshotStatus::InProgress,
            GameStatus::Draw => SnapshotStatus::Draw,
            GameStatus::XWon | GameStatus::OWon => SnapshotStatus::Win,
        }
    }
}

/// Board dimensions, carried for clients that support other sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub cols: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: BOARD_SIZE,
            cols: BOARD_SIZE,
        }
    }
}

/// One history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Mark that moved.
    pub player: Mark,
    /// Row-major index of the move.
    pub move_index: usize,
}

/// Point-in-time view of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Game identifier.
    pub game_id: String,
    /// Grid of marks, `.` for empty.
    pub board: [[Mark; BOARD_SIZE]; BOARD_SIZE],
    /// Mark due to move (the last mover once finished).
    pub current_player: Mark,
    /// Row-major indices of legal moves; empty once finished.
    pub legal_moves: Vec<usize>,
    /// Moves played.
    pub move_count: u32,
    /// Status tag.
    pub game_status: SnapshotStatus,
    /// Winning mark for `WIN`.
    pub winner: Option<Mark>,
    /// Board dimensions.
    pub config: BoardConfig,
    /// Moves in order; empty when captured without history.
    pub history: Vec<HistoryEntry>,
    /// Time of the last move, or creation.
    pub last_updated: DateTime<Utc>,
}

impl GameSnapshot {
    /// Captures `game`, with or without its move history.
    pub fn capture(game: &Game, include_history: bool) -> Self {
        let history = if include_history {
            game.moves_history()
                .iter()
                .map(|mv| HistoryEntry {
                    player: mv.mark(),
                    move_index: mv.to_index(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            game_id: game.id().to_string(),
            board: game.board().rows(),
            current_player: game.next_player(),
            legal_moves: game
                .get_legal_moves()
                .into_iter()
                .map(|pos| pos.to_index())
                .collect(),
            move_count: game.move_count(),
            game_status: game.status().into(),
            winner: game.winning_mark(),
            config: BoardConfig::default(),
            history,
            last_updated: game.last_updated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameMode, NewPlayer, PlayerId, Position};

    fn play(game: &mut Game, moves: &[(usize, usize, &str)]) {
        for (row, col, who) in moves {
            game.play_move(Position::new(*row, *col).unwrap(), &PlayerId::new(*who).unwrap())
                .unwrap();
        }
    }

    fn new_game() -> Game {
        Game::create(
            "snap",
            NewPlayer::anonymous("x"),
            Some(NewPlayer::anonymous("o")),
            GameMode::PvP,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_snapshot_in_progress_json() {
        let mut game = new_game();
        play(&mut game, &[(0, 0, "x"), (1, 1, "o")]);

        let value = serde_json::to_value(GameSnapshot::capture(&game, true)).unwrap();
        assert_eq!(value["game_id"], "snap");
        assert_eq!(
            value["board"],
            serde_json::json!([["X", ".", "."], [".", "O", "."], [".", ".", "."]])
        );
        assert_eq!(value["current_player"], "X");
        assert_eq!(value["legal_moves"], serde_json::json!([1, 2, 3, 5, 6, 7, 8]));
        assert_eq!(value["move_count"], 2);
        assert_eq!(value["game_status"], "IN_PROGRESS");
        assert_eq!(value["winner"], serde_json::Value::Null);
        assert_eq!(value["config"], serde_json::json!({"rows": 3, "cols": 3}));
        assert_eq!(
            value["history"],
            serde_json::json!([
                {"player": "X", "move_index": 0},
                {"player": "O", "move_index": 4}
            ])
        );
        assert!(value["last_updated"].is_string());
    }

    #[test]
    fn test_snapshot_win() {
        let mut game = new_game();
        play(
            &mut game,
            &[(0, 0, "x"), (1, 0, "o"), (0, 1, "x"), (1, 1, "o"), (0, 2, "x")],
        );

        let snapshot = GameSnapshot::capture(&game, false);
        assert_eq!(snapshot.game_status, SnapshotStatus::Win);
        assert_eq!(snapshot.winner, Some(Mark::X));
        assert!(snapshot.legal_moves.is_empty());
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.current_player, Mark::X);
    }

    #[test]
    fn test_snapshot_parses_back() {
        let game = new_game();
        let snapshot = GameSnapshot::capture(&game, true);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.last_updated, game.created_at());
    }
}
