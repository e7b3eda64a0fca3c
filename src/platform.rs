//! Best-effort notifications to the platform backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tictactoe_engine::{Game, GameSnapshot, Mark, Move};
use tracing::{debug, info, instrument};

/// One applied move with the game state around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveLogEntry {
    /// Game identifier.
    pub game_id: String,
    /// Who moved.
    pub player_id: String,
    /// Row-major index of the cell.
    pub move_index: usize,
    /// 1-based move number.
    pub move_number: u32,
    /// State before the move.
    pub previous_state: GameSnapshot,
    /// State after the move.
    pub next_state: GameSnapshot,
    /// When the move was applied.
    pub timestamp: DateTime<Utc>,
    /// Heuristic recorded with the move.
    pub heuristic_value: f64,
}

impl MoveLogEntry {
    /// Builds the entry for `mv` in `game_id`.
    pub fn new(game_id: &str, mv: &Move, previous_state: GameSnapshot, next_state: GameSnapshot) -> Self {
        Self {
            game_id: game_id.to_string(),
            player_id: mv.player_id().to_string(),
            move_index: mv.to_index(),
            move_number: mv.move_number(),
            timestamp: next_state.last_updated,
            heuristic_value: mv.heuristic_value(),
            previous_state,
            next_state,
        }
    }
}

/// History line in a final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMove {
    /// Mark that moved.
    pub player: Mark,
    /// Row-major index of the cell; sent as `move`.
    #[serde(rename = "move")]
    pub move_index: usize,
    /// 1-based move number.
    pub move_number: u32,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    /// Game identifier.
    pub game_id: String,
    /// Winning mark, `None` for a draw.
    pub winner: Option<Mark>,
    /// Every move in order.
    pub history: Vec<ResultMove>,
    /// Terminal state.
    pub final_state: GameSnapshot,
}

impl FinalResult {
    /// Builds the result for a finished `game`.
    pub fn from_game(game: &Game) -> Self {
        let final_state = GameSnapshot::capture(game, true);
        Self {
            game_id: game.id().to_string(),
            winner: final_state.winner,
            history: game
                .moves_history()
                .iter()
                .map(|mv| ResultMove {
                    player: mv.mark(),
                    move_index: mv.to_index(),
                    move_number: mv.move_number(),
                })
                .collect(),
            final_state,
        }
    }
}

/// Destination for game events.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Reports one applied move.
    async fn log_move(&self, entry: &MoveLogEntry) -> Result<(), PlatformError>;

    /// Reports a finished game.
    async fn send_final_result(&self, result: &FinalResult) -> Result<(), PlatformError>;
}

/// Platform that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPlatform;

#[async_trait]
impl PlatformService for DisabledPlatform {
    async fn log_move(&self, entry: &MoveLogEntry) -> Result<(), PlatformError> {
        debug!(game_id = %entry.game_id, "Platform disabled, move not sent");
        Ok(())
    }

    async fn send_final_result(&self, result: &FinalResult) -> Result<(), PlatformError> {
        debug!(game_id = %result.game_id, "Platform disabled, result not sent");
        Ok(())
    }
}

/// Platform backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlatformService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPlatformService {
    /// Creates a client for `base_url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the HTTP client cannot be built.
    #[instrument(skip(base_url), fields(base_url = %base_url))]
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::new(format!("Failed to build HTTP client: {}", e)))?;

        info!("Creating HTTP platform service");
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), PlatformError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PlatformError::new(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::new(format!("POST {} returned {}", url, status)));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformService for HttpPlatformService {
    #[instrument(skip(self, entry), fields(game_id = %entry.game_id, move_number = entry.move_number))]
    async fn log_move(&self, entry: &MoveLogEntry) -> Result<(), PlatformError> {
        self.post("/game-sessions/moves", entry).await?;
        info!("Logged move to platform");
        Ok(())
    }

    #[instrument(skip(self, result), fields(game_id = %result.game_id))]
    async fn send_final_result(&self, result: &FinalResult) -> Result<(), PlatformError> {
        self.post("/game-sessions/results", result).await?;
        info!("Sent final result to platform");
        Ok(())
    }
}

/// Platform notification error.
#[derive(Debug, Clone, Display, Error)]
#[display("Platform error: {} at {}:{}", message, file, line)]
pub struct PlatformError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl PlatformError {
    /// Creates a new platform error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
