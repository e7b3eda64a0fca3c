//! Computer-player move providers.
//!
//! [`AiService`] is the async seam the game service talks to. The local
//! implementation wraps an engine [`MoveChooser`]; the HTTP implementation
//! asks a remote AI service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tictactoe_engine::{AiDifficulty, Board, Mark, MoveChooser, Position};
use tracing::{debug, error, info, instrument};

/// Evaluation recorded when the remote service does not report one.
pub const DEFAULT_EVALUATION: f64 = 0.5;

/// A move proposed by an AI provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AiMove {
    /// Cell to play.
    pub position: Position,
    /// Provider's evaluation of the move.
    pub evaluation: f64,
    /// Free-form provider details.
    pub metadata: serde_json::Value,
}

/// Source of AI moves.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Picks a move for `mark` on `board`.
    async fn calculate_move(
        &self,
        board: &Board,
        mark: Mark,
        difficulty: AiDifficulty,
    ) -> Result<AiMove, AiError>;
}

/// In-process AI backed by a [`MoveChooser`].
#[derive(Clone)]
pub struct LocalAiService {
    chooser: Arc<dyn MoveChooser>,
}

impl LocalAiService {
    /// Wraps a chooser.
    pub fn new(chooser: Arc<dyn MoveChooser>) -> Self {
        Self { chooser }
    }
}

impl std::fmt::Debug for LocalAiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAiService").finish_non_exhaustive()
    }
}

#[async_trait]
impl AiService for LocalAiService {
    #[instrument(skip(self, board), fields(board = %board))]
    async fn calculate_move(
        &self,
        board: &Board,
        mark: Mark,
        difficulty: AiDifficulty,
    ) -> Result<AiMove, AiError> {
        let position = self
            .chooser
            .choose(board, mark, difficulty)
            .ok_or_else(|| AiError::new(format!("No legal move for {} on {}", mark, board)))?;

        debug!(%position, "Local AI chose move");
        Ok(AiMove {
            position,
            evaluation: 0.0,
            metadata: serde_json::json!({ "source": "local" }),
        })
    }
}

#[derive(Debug, Serialize)]
struct MoveRequest<'a> {
    game: &'a str,
    state: RequestState,
    difficulty: AiDifficulty,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestState {
    board: Vec<Vec<Option<Mark>>>,
    current_player: Mark,
}

#[derive(Debug, Deserialize)]
struct MoveResponse {
    #[serde(rename = "move")]
    mv: Cell,
    evaluation: Option<f64>,
    #[serde(default = "empty_metadata")]
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Cell {
    row: usize,
    col: usize,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Client for a remote AI service exposing `POST /api/ai/move`.
#[derive(Debug, Clone)]
pub struct HttpAiService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAiService {
    /// Creates a client for `base_url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the HTTP client cannot be built.
    #[instrument(skip(base_url), fields(base_url = %base_url))]
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::new(format!("Failed to build HTTP client: {}", e)))?;

        info!("Creating HTTP AI service");
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(board: &Board, mark: Mark, difficulty: AiDifficulty) -> MoveRequest<'static> {
        let board = board
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| (!cell.is_empty()).then_some(*cell))
                    .collect()
            })
            .collect();

        MoveRequest {
            game: "tictactoe",
            state: RequestState {
                board,
                current_player: mark,
            },
            difficulty,
        }
    }
}

#[async_trait]
impl AiService for HttpAiService {
    #[instrument(skip(self, board), fields(base_url = %self.base_url, board = %board))]
    async fn calculate_move(
        &self,
        board: &Board,
        mark: Mark,
        difficulty: AiDifficulty,
    ) -> Result<AiMove, AiError> {
        let body = Self::request_body(board, mark, difficulty);

        debug!("Requesting AI move");
        let response = self
            .client
            .post(format!("{}/api/ai/move", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::new(format!("AI service request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::new(format!("AI service error {}: {}", status, text)));
        }

        let parsed: MoveResponse = response
            .json()
            .await
            .map_err(|e| AiError::new(format!("Failed to parse AI response: {}", e)))?;

        let position = Position::new(parsed.mv.row, parsed.mv.col)
            .map_err(|e| AiError::new(format!("AI returned an invalid cell: {}", e)))?;
        let evaluation = parsed.evaluation.unwrap_or(DEFAULT_EVALUATION);

        info!(%position, evaluation, "AI move received");
        Ok(AiMove {
            position,
            evaluation,
            metadata: parsed.metadata,
        })
    }
}

/// AI provider error.
#[derive(Debug, Clone, Display, Error)]
#[display("AI error: {} at {}:{}", message, file, line)]
pub struct AiError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl AiError {
    /// Creates a new AI error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "AI error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_engine::FirstLegalMove;

    #[test]
    fn test_request_body_shape() {
        let board: Board = "X...O....".parse().unwrap();
        let body = HttpAiService::request_body(&board, Mark::X, AiDifficulty::Hard);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "game": "tictactoe",
                "state": {
                    "board": [["X", null, null], [null, "O", null], [null, null, null]],
                    "currentPlayer": "X"
                },
                "difficulty": "hard"
            })
        );
    }

    #[test]
    fn test_response_defaults() {
        let parsed: MoveResponse =
            serde_json::from_str(r#"{"move": {"row": 2, "col": 1}}"#).unwrap();
        assert_eq!((parsed.mv.row, parsed.mv.col), (2, 1));
        assert!(parsed.evaluation.is_none());
        assert_eq!(parsed.metadata, serde_json::json!({}));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let service = HttpAiService::new("http://ai.local/".to_string(), Duration::from_secs(1)).unwrap();
        assert_eq!(service.base_url(), "http://ai.local");
    }

    #[tokio::test]
    async fn test_local_service_uses_chooser() {
        let service = LocalAiService::new(Arc::new(FirstLegalMove));
        let board: Board = "XO.......".parse().unwrap();

        let mv = service
            .calculate_move(&board, Mark::X, AiDifficulty::Easy)
            .await
            .unwrap();
        assert_eq!(mv.position, Position::new(0, 2).unwrap());
        assert_eq!(mv.evaluation, 0.0);
    }

    #[tokio::test]
    async fn test_local_service_full_board_errors() {
        let service = LocalAiService::new(Arc::new(FirstLegalMove));
        let board: Board = "XOXXOOOXX".parse().unwrap();

        let result = service
            .calculate_move(&board, Mark::O, AiDifficulty::Medium)
            .await;
        assert!(result.is_err());
    }
}
