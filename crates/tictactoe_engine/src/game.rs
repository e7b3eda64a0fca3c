//! Game aggregate and move-application state machine.
//!
//! `Game` owns turn order, the move counter, the history and the status.
//! It is the only thing allowed to replace the board of a running game.
//!
//! ```text
//! IN_PROGRESS ──play_move──▶ IN_PROGRESS | X_WON | O_WON | DRAW
//! X_WON, O_WON, DRAW: terminal, every play_move fails
//! ```

use crate::action::Move;
use crate::chooser::MoveChooser;
use crate::error::GameError;
use crate::invariants::{GameInvariants, InvariantSet, InvariantViolation};
use crate::player::{NewPlayer, Player, PlayerId};
use crate::rules;
use crate::{AiDifficulty, Board, GameMode, GameStatus, Mark, Position};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

/// A tic-tac-toe game between two seated players.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    id: String,
    player_x: Player,
    player_o: Player,
    mode: GameMode,
    board: Board,
    status: GameStatus,
    next_player: Mark,
    move_count: u32,
    moves_history: Vec<Move>,
    ai_difficulty: Option<AiDifficulty>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// Stored pieces of a game, used to rebuild the aggregate.
#[derive(Debug, Clone)]
pub struct GameParts {
    /// Game identifier.
    pub id: String,
    /// Seat X.
    pub player_x: Player,
    /// Seat O.
    pub player_o: Player,
    /// Game mode.
    pub mode: GameMode,
    /// Current board.
    pub board: Board,
    /// Current status.
    pub status: GameStatus,
    /// Mark due to move.
    pub next_player: Mark,
    /// Moves played.
    pub move_count: u32,
    /// Ordered history.
    pub moves_history: Vec<Move>,
    /// AI strength, PvAI only.
    pub ai_difficulty: Option<AiDifficulty>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// First time the game became terminal.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Creates a game with an empty board and X to move.
    ///
    /// In PvAI mode seat O is always the AI; `player_o` may be omitted or
    /// name the AI id. In PvP mode `player_o` is required and must be a
    /// different, human player. The difficulty is kept only for PvAI.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidSetup`] when players and mode do not fit,
    /// or [`GameError::InvalidPlayerId`] for blank ids.
    #[instrument(skip(id, player_x, player_o), fields(game_id))]
    pub fn create(
        id: impl Into<String>,
        player_x: NewPlayer,
        player_o: Option<NewPlayer>,
        mode: GameMode,
        ai_difficulty: Option<AiDifficulty>,
    ) -> Result<Self, GameError> {
        let id = id.into();
        tracing::Span::current().record("game_id", id.as_str());
        if id.trim().is_empty() {
            return Err(GameError::InvalidSetup("game id cannot be empty".to_string()));
        }

        let player_x = player_x.into_player(Mark::X, "Player X")?;
        if player_x.is_ai() {
            return Err(GameError::InvalidSetup("player X cannot be the AI".to_string()));
        }

        let (player_o, ai_difficulty) = match mode {
            GameMode::PvAI => {
                if let Some(requested) = player_o {
                    if !PlayerId::new(requested.id)?.is_ai() {
                        return Err(GameError::InvalidSetup(
                            "in PvAI mode, player O must be the AI".to_string(),
                        ));
                    }
                }
                (Player::new(PlayerId::ai(), "AI", Mark::O), ai_difficulty)
            }
            GameMode::PvP => {
                let requested = player_o.ok_or_else(|| {
                    GameError::InvalidSetup("player O id is required for PvP mode".to_string())
                })?;
                let player_o = requested.into_player(Mark::O, "Player O")?;
                if player_o.is_ai() {
                    return Err(GameError::InvalidSetup(
                        "PvP mode requires two human players".to_string(),
                    ));
                }
                if player_o.id() == player_x.id() {
                    return Err(GameError::InvalidSetup(
                        "players X and O must be different".to_string(),
                    ));
                }
                (player_o, None)
            }
        };

        info!(
            player_x = %player_x.id(),
            player_o = %player_o.id(),
            %mode,
            "Creating game"
        );

        Ok(Self {
            id,
            player_x,
            player_o,
            mode,
            board: Board::empty(),
            status: GameStatus::InProgress,
            next_player: Mark::X,
            move_count: 0,
            moves_history: Vec::new(),
            ai_difficulty,
            created_at: Utc::now(),
            finished_at: None,
        })
    }

    /// Rebuilds a game from stored parts.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InconsistentState`] if the parts break any game
    /// invariant or the seats hold the wrong marks.
    #[instrument(skip(parts), fields(game_id = %parts.id))]
    pub fn restore(parts: GameParts) -> Result<Self, GameError> {
        if parts.player_x.mark() != Mark::X || parts.player_o.mark() != Mark::O {
            return Err(GameError::InconsistentState(
                "seats hold the wrong marks".to_string(),
            ));
        }

        let game = Self {
            id: parts.id,
            player_x: parts.player_x,
            player_o: parts.player_o,
            mode: parts.mode,
            board: parts.board,
            status: parts.status,
            next_player: parts.next_player,
            move_count: parts.move_count,
            moves_history: parts.moves_history,
            ai_difficulty: parts.ai_difficulty,
            created_at: parts.created_at,
            finished_at: parts.finished_at,
        };

        game.check_invariants().map_err(|violations| {
            GameError::InconsistentState(
                violations
                    .iter()
                    .map(|v| v.description.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        debug!(move_count = game.move_count, status = %game.status, "Game restored");
        Ok(game)
    }

    /// Plays `position` for `player_id` and returns the recorded move.
    ///
    /// The recorded heuristic is [`rules::calculate_heuristic`] of the status
    /// before the move, from the mover's point of view.
    ///
    /// # Errors
    ///
    /// In order of checking: [`GameError::GameAlreadyFinished`],
    /// [`GameError::WrongTurn`], [`GameError::CellOccupied`]. A rejected
    /// move leaves the game untouched.
    pub fn play_move(&mut self, position: Position, player_id: &PlayerId) -> Result<Move, GameError> {
        self.apply(position, player_id, None)
    }

    /// Like [`Game::play_move`], but records `evaluation` as the heuristic.
    ///
    /// Used when the mover reports its own evaluation, as the AI does.
    pub fn play_evaluated_move(
        &mut self,
        position: Position,
        player_id: &PlayerId,
        evaluation: f64,
    ) -> Result<Move, GameError> {
        self.apply(position, player_id, Some(evaluation))
    }

    #[instrument(skip(self), fields(game_id = %self.id, move_count = self.move_count))]
    fn apply(
        &mut self,
        position: Position,
        player_id: &PlayerId,
        evaluation: Option<f64>,
    ) -> Result<Move, GameError> {
        if self.status.is_finished() {
            warn!(status = %self.status, "Move attempted on finished game");
            return Err(GameError::GameAlreadyFinished);
        }

        let current = self.current_player();
        if current.id() != player_id {
            warn!(expected = %current.id(), "Player tried to move out of turn");
            return Err(GameError::WrongTurn {
                expected: current.id().clone(),
                actual: player_id.clone(),
            });
        }

        if !rules::is_valid_move(&self.board, position) {
            warn!(%position, "Cell already occupied");
            return Err(GameError::CellOccupied(position));
        }

        let mover = self.next_player;
        let heuristic = rules::calculate_heuristic(self.status, mover);
        let heuristic = evaluation.unwrap_or(heuristic);

        self.board = self.board.with_mark(position, mover)?;
        self.move_count += 1;

        let now = Utc::now();
        let played = Move::new(
            position,
            mover,
            player_id.clone(),
            self.move_count,
            heuristic,
            now,
        );
        self.moves_history.push(played.clone());

        self.status = rules::calculate_status(&self.board, self.move_count);
        if self.status == GameStatus::InProgress {
            self.next_player = mover.opposite();
        } else if self.finished_at.is_none() {
            self.finished_at = Some(now);
            info!(status = %self.status, moves = self.move_count, "Game finished");
        }

        debug_assert!(
            self.check_invariants().is_ok(),
            "game invariants violated after move"
        );

        debug!(%played, status = %self.status, "Move applied");
        Ok(played)
    }

    /// Checks every game invariant.
    pub fn check_invariants(&self) -> Result<(), Vec<InvariantViolation>> {
        <GameInvariants as InvariantSet<Game>>::check_all(self)
    }

    /// True iff the game is PvAI and the player due to move is the AI.
    pub fn is_ai_turn(&self) -> bool {
        self.mode == GameMode::PvAI && self.current_player().is_ai()
    }

    /// Legal positions, or none once the game is finished.
    pub fn get_legal_moves(&self) -> Vec<Position> {
        if self.is_finished() {
            return Vec::new();
        }
        rules::get_legal_moves(&self.board)
    }

    /// Asks `chooser` for a move for the player due to move.
    ///
    /// Returns `None` once finished, or if the chooser offers an occupied cell.
    pub fn suggest_move(&self, chooser: &dyn MoveChooser, difficulty: AiDifficulty) -> Option<Position> {
        if self.is_finished() {
            return None;
        }
        chooser
            .choose(&self.board, self.next_player, difficulty)
            .filter(|pos| self.board.is_empty(*pos))
    }

    /// The player bound to the mark due to move.
    pub fn current_player(&self) -> &Player {
        match self.next_player {
            Mark::O => &self.player_o,
            Mark::X | Mark::Empty => &self.player_x,
        }
    }

    /// The player placing `mark`.
    pub fn player_for(&self, mark: Mark) -> Option<&Player> {
        match mark {
            Mark::X => Some(&self.player_x),
            Mark::O => Some(&self.player_o),
            Mark::Empty => None,
        }
    }

    /// The winning player, if any.
    pub fn winner(&self) -> Option<&Player> {
        self.winning_mark().and_then(|mark| self.player_for(mark))
    }

    /// The winning mark, if any.
    pub fn winning_mark(&self) -> Option<Mark> {
        self.status.winner()
    }

    /// True once the status is terminal.
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Time of the last move, or creation time before any move.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.moves_history
            .last()
            .map(Move::timestamp)
            .unwrap_or(self.created_at)
    }

    /// Game identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Seat X.
    pub fn player_x(&self) -> &Player {
        &self.player_x
    }

    /// Seat O.
    pub fn player_o(&self) -> &Player {
        &self.player_o
    }

    /// Game mode.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Mark due to move.
    pub fn next_player(&self) -> Mark {
        self.next_player
    }

    /// Number of moves played.
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// Moves in the order they were played.
    pub fn moves_history(&self) -> &[Move] {
        &self.moves_history
    }

    /// AI strength, PvAI only.
    pub fn ai_difficulty(&self) -> Option<AiDifficulty> {
        self.ai_difficulty
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// First time the game became terminal.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chooser::FirstLegalMove;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col).unwrap()
    }

    fn pvp() -> (Game, PlayerId, PlayerId) {
        let game = Game::create(
            "g1",
            NewPlayer::named("alice", "Alice"),
            Some(NewPlayer::named("bob", "Bob")),
            GameMode::PvP,
            None,
        )
        .unwrap();
        (game, PlayerId::new("alice").unwrap(), PlayerId::new("bob").unwrap())
    }

    #[test]
    fn test_new_game() {
        let (game, _, _) = pvp();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.next_player(), Mark::X);
        assert_eq!(game.move_count(), 0);
        assert_eq!(game.get_legal_moves().len(), 9);
        assert!(game.finished_at().is_none());
        assert!(game.check_invariants().is_ok());
    }

    #[test]
    fn test_pvp_requires_player_o() {
        let err = Game::create("g", NewPlayer::anonymous("alice"), None, GameMode::PvP, None);
        assert!(matches!(err, Err(GameError::InvalidSetup(_))));
    }

    #[test]
    fn test_pvp_rejects_same_player_twice() {
        let err = Game::create(
            "g",
            NewPlayer::anonymous("alice"),
            Some(NewPlayer::anonymous("alice")),
            GameMode::PvP,
            None,
        );
        assert!(matches!(err, Err(GameError::InvalidSetup(_))));
    }

    #[test]
    fn test_pvai_seats_ai_as_o() {
        let game = Game::create(
            "g",
            NewPlayer::anonymous("alice"),
            None,
            GameMode::PvAI,
            Some(AiDifficulty::Hard),
        )
        .unwrap();
        assert!(game.player_o().is_ai());
        assert_eq!(game.player_o().name(), "AI");
        assert_eq!(game.player_x().name(), "Player X");
        assert_eq!(game.ai_difficulty(), Some(AiDifficulty::Hard));
        assert!(!game.is_ai_turn());
    }

    #[test]
    fn test_pvai_rejects_human_o() {
        let err = Game::create(
            "g",
            NewPlayer::anonymous("alice"),
            Some(NewPlayer::anonymous("bob")),
            GameMode::PvAI,
            None,
        );
        assert!(matches!(err, Err(GameError::InvalidSetup(_))));
    }

    #[test]
    fn test_play_move_records_history() {
        let (mut game, alice, _) = pvp();
        let played = game.play_move(pos(1, 1), &alice).unwrap();
        assert_eq!(played.move_number(), 1);
        assert_eq!(played.mark(), Mark::X);
        assert_eq!(played.heuristic_value(), 0.0);
        assert_eq!(game.moves_history().len(), 1);
        assert_eq!(game.next_player(), Mark::O);
        assert_eq!(game.last_updated(), played.timestamp());
    }

    #[test]
    fn test_wrong_turn_rejected() {
        let (mut game, _, bob) = pvp();
        let err = game.play_move(pos(0, 0), &bob).unwrap_err();
        assert!(matches!(err, GameError::WrongTurn { .. }));
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_evaluated_move_overrides_heuristic() {
        let mut game = Game::create("g", NewPlayer::anonymous("alice"), None, GameMode::PvAI, None)
            .unwrap();
        game.play_move(pos(0, 0), &PlayerId::new("alice").unwrap()).unwrap();
        assert!(game.is_ai_turn());
        let played = game.play_evaluated_move(pos(1, 1), &PlayerId::ai(), 0.75).unwrap();
        assert_eq!(played.heuristic_value(), 0.75);
        assert!(!game.is_ai_turn());
    }

    #[test]
    fn test_suggest_move() {
        let (mut game, alice, _) = pvp();
        game.play_move(pos(0, 0), &alice).unwrap();
        assert_eq!(
            game.suggest_move(&FirstLegalMove, AiDifficulty::Easy),
            Some(pos(0, 1))
        );
    }

    #[test]
    fn test_restore_round_trip() {
        let (mut game, alice, bob) = pvp();
        game.play_move(pos(0, 0), &alice).unwrap();
        game.play_move(pos(2, 2), &bob).unwrap();

        let parts = GameParts {
            id: game.id().to_string(),
            player_x: game.player_x().clone(),
            player_o: game.player_o().clone(),
            mode: game.mode(),
            board: *game.board(),
            status: game.status(),
            next_player: game.next_player(),
            move_count: game.move_count(),
            moves_history: game.moves_history().to_vec(),
            ai_difficulty: game.ai_difficulty(),
            created_at: game.created_at(),
            finished_at: game.finished_at(),
        };
        assert_eq!(Game::restore(parts).unwrap(), game);
    }

    #[test]
    fn test_restore_rejects_tampered_board() {
        let (mut game, alice, _) = pvp();
        game.play_move(pos(0, 0), &alice).unwrap();

        let parts = GameParts {
            id: game.id().to_string(),
            player_x: game.player_x().clone(),
            player_o: game.player_o().clone(),
            mode: game.mode(),
            board: "XO.......".parse().unwrap(),
            status: game.status(),
            next_player: game.next_player(),
            move_count: game.move_count(),
            moves_history: game.moves_history().to_vec(),
            ai_difficulty: None,
            created_at: game.created_at(),
            finished_at: None,
        };
        assert!(matches!(
            Game::restore(parts),
            Err(GameError::InconsistentState(_))
        ));
    }
}
