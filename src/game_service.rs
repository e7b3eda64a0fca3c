//! Application service: loads games, applies moves, persists, notifies.

use std::sync::Arc;

use derive_more::Display;
use serde::Deserialize;
use tictactoe_engine::{
    AiDifficulty, Game, GameError, GameMode, GameSnapshot, Mark, Move, NewPlayer, PlayerId,
    Position,
};
use tracing::{Instrument, debug, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::ai_service::{AiError, AiService};
use crate::db::{DbError, DbErrorKind, GameRepository};
use crate::platform::{FinalResult, MoveLogEntry, PlatformService};

/// Page size used when a listing does not ask for one.
pub const DEFAULT_LIST_LIMIT: i64 = 20;
/// Largest page a listing may ask for.
pub const MAX_LIST_LIMIT: i64 = 100;

/// Request to start a game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateGameCommand {
    /// Id of the X player.
    pub player_x_id: String,
    /// Display name of the X player.
    #[serde(default)]
    pub player_x_name: Option<String>,
    /// Id of the O player; PvP only.
    #[serde(default)]
    pub player_o_id: Option<String>,
    /// Display name of the O player; PvP only.
    #[serde(default)]
    pub player_o_name: Option<String>,
    /// Game mode.
    pub mode: GameMode,
    /// AI strength for PvAI games.
    #[serde(default)]
    pub ai_difficulty: Option<AiDifficulty>,
}

/// Request to play one move.
///
/// Leaving out the coordinates on the AI's turn asks the AI to move.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayMoveCommand {
    /// Target game.
    pub game_id: String,
    /// Mover; required for human moves.
    pub player_id: Option<String>,
    /// Row, 0-2.
    pub row: Option<usize>,
    /// Column, 0-2.
    pub col: Option<usize>,
    /// Overrides the game's AI difficulty for this move.
    pub ai_difficulty: Option<AiDifficulty>,
}

/// A move that was applied and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// Latest stored state of the game.
    pub game: Game,
    /// The move itself.
    pub applied: Move,
    /// The AI's answer to a human move in a PvAI game, when it succeeded.
    pub ai_reply: Option<Move>,
}

/// A suggested move for the player due to move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hint {
    /// Mark the suggestion is for.
    pub player: Mark,
    /// Suggested cell.
    pub position: Position,
    /// The AI's evaluation of the suggestion.
    pub evaluation: f64,
}

/// Failure of a service operation.
#[derive(Debug, Display)]
pub enum ServiceError {
    /// No game with this id.
    #[display("Game not found: {}", _0)]
    NotFound(String),
    /// A human move without row and column.
    #[display("Row and column are required for a human move")]
    MissingCoordinates,
    /// A human move without a player id.
    #[display("Player id is required for a human move")]
    MissingPlayer,
    /// AI move requested while a human is to move.
    #[display("It is not the AI's turn in game {}", _0)]
    NotAiTurn(String),
    /// The engine rejected the move or setup.
    #[display("{}", _0)]
    Game(GameError),
    /// The AI provider failed.
    #[display("{}", _0)]
    Ai(AiError),
    /// Storage failed.
    #[display("{}", _0)]
    Db(DbError),
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Game(e) => Some(e),
            ServiceError::Ai(e) => Some(e),
            ServiceError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        ServiceError::Game(err)
    }
}

impl From<AiError> for ServiceError {
    fn from(err: AiError) -> Self {
        ServiceError::Ai(err)
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        ServiceError::Db(err)
    }
}

impl ServiceError {
    /// True when a concurrent writer got there first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Db(e) if e.kind == DbErrorKind::Conflict)
    }
}

/// Game use cases over a repository, an AI and a platform notifier.
#[derive(Clone)]
pub struct GameService {
    repository: GameRepository,
    ai: Arc<dyn AiService>,
    platform: Arc<dyn PlatformService>,
    default_difficulty: AiDifficulty,
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("repository", &self.repository)
            .field("default_difficulty", &self.default_difficulty)
            .finish_non_exhaustive()
    }
}

impl GameService {
    /// Creates the service.
    #[instrument(skip(repository, ai, platform))]
    pub fn new(
        repository: GameRepository,
        ai: Arc<dyn AiService>,
        platform: Arc<dyn PlatformService>,
        default_difficulty: AiDifficulty,
    ) -> Self {
        info!("Creating GameService");
        Self {
            repository,
            ai,
            platform,
            default_difficulty,
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &GameRepository {
        &self.repository
    }

    /// Starts and stores a new game with a fresh UUID.
    #[instrument(skip(self, command), fields(mode = %command.mode, game_id))]
    pub async fn create_game(&self, command: CreateGameCommand) -> Result<Game, ServiceError> {
        let id = Uuid::new_v4().to_string();
        tracing::Span::current().record("game_id", id.as_str());

        let player_o = command
            .player_o_id
            .map(|id| NewPlayer::new(id, command.player_o_name));
        let difficulty = command.ai_difficulty.unwrap_or(self.default_difficulty);

        let game = Game::create(
            id,
            NewPlayer::new(command.player_x_id, command.player_x_name),
            player_o,
            command.mode,
            Some(difficulty),
        )?;

        let stored = game.clone();
        self.with_repository(move |repo| repo.save(&stored)).await?;

        info!("Game created");
        Ok(game)
    }

    /// Loads a game.
    #[instrument(skip(self))]
    pub async fn get_game(&self, game_id: &str) -> Result<Game, ServiceError> {
        let id = game_id.to_string();
        self.with_repository(move |repo| repo.find_by_id(&id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(game_id.to_string()))
    }

    /// Most recent games first. The limit defaults to 20 and is capped at 100.
    #[instrument(skip(self))]
    pub async fn list_games(&self, limit: Option<i64>) -> Result<Vec<Game>, ServiceError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let games = self.with_repository(move |repo| repo.list(limit)).await?;
        debug!(count = games.len(), "Games listed");
        Ok(games)
    }

    /// Deletes a game and its history.
    #[instrument(skip(self))]
    pub async fn delete_game(&self, game_id: &str) -> Result<(), ServiceError> {
        let id = game_id.to_string();
        if self.with_repository(move |repo| repo.delete(&id)).await? {
            info!("Game deleted");
            Ok(())
        } else {
            Err(ServiceError::NotFound(game_id.to_string()))
        }
    }

    /// Plays a human move, or the AI's move when it is the AI's turn and
    /// no coordinates are given.
    ///
    /// A human move that hands the turn to the AI is answered by the AI
    /// straight away. If that answer fails the human move still stands and
    /// the game waits for [`GameService::play_ai_move`].
    #[instrument(skip(self, command), fields(game_id = %command.game_id))]
    pub async fn play_move(&self, command: PlayMoveCommand) -> Result<MoveOutcome, ServiceError> {
        let game = self.get_game(&command.game_id).await?;
        let difficulty = command.ai_difficulty;
        let outcome = self.apply(game, command).await?;
        Ok(self.reply_as_ai(outcome, difficulty).await)
    }

    /// Suggests a move for whoever is due to move, without playing it.
    ///
    /// # Errors
    ///
    /// [`GameError::GameAlreadyFinished`] once the game is over.
    #[instrument(skip(self))]
    pub async fn hint(
        &self,
        game_id: &str,
        difficulty: Option<AiDifficulty>,
    ) -> Result<Hint, ServiceError> {
        let game = self.get_game(game_id).await?;
        if game.is_finished() {
            return Err(GameError::GameAlreadyFinished.into());
        }

        let ai_move = self
            .ai
            .calculate_move(game.board(), game.next_player(), self.difficulty_for(&game, difficulty))
            .await?;
        if !game.board().is_empty(ai_move.position) {
            return Err(AiError::new(format!(
                "AI suggested occupied cell {}",
                ai_move.position
            ))
            .into());
        }

        debug!(position = %ai_move.position, "Hint computed");
        Ok(Hint {
            player: game.next_player(),
            position: ai_move.position,
            evaluation: ai_move.evaluation,
        })
    }

    /// Plays the AI's move.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotAiTurn`] if a human is to move.
    #[instrument(skip(self))]
    pub async fn play_ai_move(
        &self,
        game_id: &str,
        difficulty: Option<AiDifficulty>,
    ) -> Result<MoveOutcome, ServiceError> {
        let game = self.get_game(game_id).await?;
        if game.is_finished() {
            return Err(GameError::GameAlreadyFinished.into());
        }
        if !game.is_ai_turn() {
            return Err(ServiceError::NotAiTurn(game_id.to_string()));
        }

        let command = PlayMoveCommand {
            game_id: game_id.to_string(),
            ai_difficulty: difficulty,
            ..PlayMoveCommand::default()
        };
        self.apply(game, command).await
    }

    async fn apply(&self, mut game: Game, command: PlayMoveCommand) -> Result<MoveOutcome, ServiceError> {
        if game.is_finished() {
            return Err(GameError::GameAlreadyFinished.into());
        }

        let loaded_count = game.move_count();
        let before = GameSnapshot::capture(&game, true);

        let applied = match (command.row, command.col) {
            (row, col) if game.is_ai_turn() && (row.is_none() || col.is_none()) => {
                let difficulty = self.difficulty_for(&game, command.ai_difficulty);
                debug!(%difficulty, "Asking AI for a move");

                let ai_move = self
                    .ai
                    .calculate_move(game.board(), game.next_player(), difficulty)
                    .await?;
                game.play_evaluated_move(ai_move.position, &PlayerId::ai(), ai_move.evaluation)
                    .map_err(|e| AiError::new(format!("AI proposed an unplayable move: {}", e)))?
            }
            (Some(row), Some(col)) => {
                let player_id = command.player_id.ok_or(ServiceError::MissingPlayer)?;
                game.play_move(Position::new(row, col)?, &PlayerId::new(player_id)?)?
            }
            _ => return Err(ServiceError::MissingCoordinates),
        };

        let after = GameSnapshot::capture(&game, true);
        let stored = game.clone();
        self.with_repository(move |repo| repo.save_if_unchanged(&stored, loaded_count))
            .await?;

        info!(
            move_number = applied.move_number(),
            position = %applied.position(),
            status = %game.status(),
            "Move applied"
        );

        self.notify(&game, &applied, before, after);
        Ok(MoveOutcome {
            game,
            applied,
            ai_reply: None,
        })
    }

    /// Lets the AI answer a human move that left it to move.
    async fn reply_as_ai(
        &self,
        outcome: MoveOutcome,
        difficulty: Option<AiDifficulty>,
    ) -> MoveOutcome {
        if outcome.applied.player_id().is_ai()
            || outcome.game.is_finished()
            || !outcome.game.is_ai_turn()
        {
            return outcome;
        }

        let command = PlayMoveCommand {
            game_id: outcome.game.id().to_string(),
            ai_difficulty: difficulty,
            ..PlayMoveCommand::default()
        };
        match self.apply(outcome.game.clone(), command).await {
            Ok(reply) => MoveOutcome {
                game: reply.game,
                applied: outcome.applied,
                ai_reply: Some(reply.applied),
            },
            Err(e) => {
                warn!(error = %e, "AI reply failed, game waits for an explicit AI move");
                outcome
            }
        }
    }

    fn difficulty_for(&self, game: &Game, requested: Option<AiDifficulty>) -> AiDifficulty {
        requested
            .or(game.ai_difficulty())
            .unwrap_or(self.default_difficulty)
    }

    /// Sends platform events in the background; failures only warn.
    fn notify(&self, game: &Game, applied: &Move, before: GameSnapshot, after: GameSnapshot) {
        let platform = Arc::clone(&self.platform);
        let entry = MoveLogEntry::new(game.id(), applied, before, after);
        let result = game.is_finished().then(|| FinalResult::from_game(game));
        let span = info_span!("platform_notify", game_id = %game.id());

        tokio::spawn(
            async move {
                if let Err(e) = platform.log_move(&entry).await {
                    warn!(error = %e, "Failed to log move to platform");
                }
                if let Some(result) = result {
                    if let Err(e) = platform.send_final_result(&result).await {
                        warn!(error = %e, "Failed to send final result to platform");
                    }
                }
            }
            .instrument(span),
        );
    }

    async fn with_repository<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(GameRepository) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || f(repository))
            .await
            .map_err(|e| DbError::new(format!("Database task failed: {}", e)))?
    }
}
