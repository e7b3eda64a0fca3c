//! REST API over [`GameService`].

use axum::{
    Json, Router,
    body::Body,
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::{Request, StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tictactoe_engine::{
    AiDifficulty, BOARD_SIZE, Game, GameMode, GameSnapshot, GameStatus, Mark, Move, Player,
};
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};

use crate::game_service::{
    CreateGameCommand, GameService, Hint, MoveOutcome, PlayMoveCommand, ServiceError,
};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    service: GameService,
}

impl AppState {
    /// Wraps the service.
    pub fn new(service: GameService) -> Self {
        Self { service }
    }
}

/// Builds the API router.
pub fn router(service: GameService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/games", post(create_game).get(list_games))
        .route("/games/{id}", get(get_game).delete(delete_game))
        .route("/games/{id}/moves", post(play_move))
        .route("/games/{id}/ai-move", post(play_ai_move))
        .route("/games/{id}/state", get(game_state))
        .route("/games/{id}/hint", get(hint))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(AppState::new(service))
}

/// A seat as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Player id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Mark.
    pub mark: Mark,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id().to_string(),
            name: player.name().to_string(),
            mark: player.mark(),
        }
    }
}

/// A move as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveView {
    /// 1-based move number.
    pub move_number: u32,
    /// Row, 0-2.
    pub row: usize,
    /// Column, 0-2.
    pub col: usize,
    /// Mark placed.
    pub mark: Mark,
    /// Mover.
    pub player_id: String,
    /// Recorded heuristic.
    pub heuristic_value: f64,
    /// When it was played.
    pub timestamp: DateTime<Utc>,
}

impl From<&Move> for MoveView {
    fn from(mv: &Move) -> Self {
        Self {
            move_number: mv.move_number(),
            row: mv.position().row(),
            col: mv.position().col(),
            mark: mv.mark(),
            player_id: mv.player_id().to_string(),
            heuristic_value: mv.heuristic_value(),
            timestamp: mv.timestamp(),
        }
    }
}

/// A game as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    /// Game id.
    pub id: String,
    /// Game mode.
    pub mode: GameMode,
    /// Grid of marks.
    pub board: [[Mark; BOARD_SIZE]; BOARD_SIZE],
    /// Status tag.
    pub status: GameStatus,
    /// Mark due to move.
    pub next_player: Mark,
    /// Moves played.
    pub move_count: u32,
    /// Seat X.
    pub player_x: PlayerView,
    /// Seat O.
    pub player_o: PlayerView,
    /// Winning player id, if any.
    pub winner: Option<String>,
    /// AI strength for PvAI.
    pub ai_difficulty: Option<AiDifficulty>,
    /// Whether the AI is to move.
    pub is_ai_turn: bool,
    /// Row-major indices still playable.
    pub legal_moves: Vec<usize>,
    /// Move history.
    pub moves: Vec<MoveView>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Finish time.
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id().to_string(),
            mode: game.mode(),
            board: game.board().rows(),
            status: game.status(),
            next_player: game.next_player(),
            move_count: game.move_count(),
            player_x: game.player_x().into(),
            player_o: game.player_o().into(),
            winner: game.winner().map(|p| p.id().to_string()),
            ai_difficulty: game.ai_difficulty(),
            is_ai_turn: !game.is_finished() && game.is_ai_turn(),
            legal_moves: game
                .get_legal_moves()
                .into_iter()
                .map(|pos| pos.to_index())
                .collect(),
            moves: game.moves_history().iter().map(MoveView::from).collect(),
            created_at: game.created_at(),
            finished_at: game.finished_at(),
        }
    }
}

/// Response to a played move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Latest state of the game.
    pub game: GameView,
    /// The move that was applied.
    pub applied: MoveView,
    /// The AI's answer, when it moved right after.
    pub ai_reply: Option<MoveView>,
}

impl From<&MoveOutcome> for MoveResponse {
    fn from(outcome: &MoveOutcome) -> Self {
        Self {
            game: GameView::from(&outcome.game),
            applied: MoveView::from(&outcome.applied),
            ai_reply: outcome.ai_reply.as_ref().map(MoveView::from),
        }
    }
}

/// Suggested move as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintView {
    /// Mark the suggestion is for.
    pub player: Mark,
    /// Row, 0-2.
    pub row: usize,
    /// Column, 0-2.
    pub col: usize,
    /// Row-major index.
    pub move_index: usize,
    /// The AI's evaluation.
    pub evaluation: f64,
}

impl From<Hint> for HintView {
    fn from(hint: Hint) -> Self {
        Self {
            player: hint.player,
            row: hint.position.row(),
            col: hint.position.col(),
            move_index: hint.position.to_index(),
            evaluation: hint.evaluation,
        }
    }
}

/// Body of `POST /games/{id}/moves`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayMoveRequest {
    /// Mover; required for human moves.
    #[serde(default)]
    pub player_id: Option<String>,
    /// Row, 0-2.
    #[serde(default)]
    pub row: Option<usize>,
    /// Column, 0-2.
    #[serde(default)]
    pub col: Option<usize>,
    /// AI strength override.
    #[serde(default)]
    pub ai_difficulty: Option<AiDifficulty>,
}

/// Body of `POST /games/{id}/ai-move`; `{}` uses the game's difficulty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiMoveRequest {
    /// AI strength override.
    #[serde(default)]
    pub ai_difficulty: Option<AiDifficulty>,
}

/// Query of `GET /games`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Page size.
    pub limit: Option<i64>,
}

/// Query of `GET /games/{id}/hint`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HintQuery {
    /// AI strength override.
    pub ai_difficulty: Option<AiDifficulty>,
}

/// JSON body extractor whose rejections are [`ApiError::BadRequest`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string extractor whose rejections are [`ApiError::BadRequest`].
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Failure from the service layer.
    Service(ServiceError),
    /// Unreadable request body or query.
    BadRequest(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(err) => match err {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::MissingCoordinates
                | ServiceError::MissingPlayer
                | ServiceError::NotAiTurn(_)
                | ServiceError::Game(_) => StatusCode::BAD_REQUEST,
                ServiceError::Ai(_) => StatusCode::BAD_GATEWAY,
                ServiceError::Db(_) if err.is_conflict() => StatusCode::CONFLICT,
                ServiceError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Service(ServiceError::Ai(e)) => e.message.clone(),
            ApiError::Service(ServiceError::Db(e)) => e.message.clone(),
            ApiError::Service(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(%status, error = %message, "Request failed");
        } else {
            warn!(%status, error = %message, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip(state, command))]
async fn create_game(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<CreateGameCommand>,
) -> Result<(StatusCode, Json<GameView>), ApiError> {
    let game = state.service.create_game(command).await?;
    info!(game_id = %game.id(), "Game created via API");
    Ok((StatusCode::CREATED, Json(GameView::from(&game))))
}

#[instrument(skip(state))]
async fn list_games(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<GameView>>, ApiError> {
    let games = state.service.list_games(query.limit).await?;
    Ok(Json(games.iter().map(GameView::from).collect()))
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    let game = state.service.get_game(&id).await?;
    Ok(Json(GameView::from(&game)))
}

#[instrument(skip(state))]
async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_game(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, request))]
async fn play_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<PlayMoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let command = PlayMoveCommand {
        game_id: id,
        player_id: request.player_id,
        row: request.row,
        col: request.col,
        ai_difficulty: request.ai_difficulty,
    };
    let outcome = state.service.play_move(command).await?;
    Ok(Json(MoveResponse::from(&outcome)))
}

#[instrument(skip(state, request))]
async fn play_ai_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AiMoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let outcome = state
        .service
        .play_ai_move(&id, request.ai_difficulty)
        .await?;
    Ok(Json(MoveResponse::from(&outcome)))
}

#[instrument(skip(state))]
async fn hint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<HintQuery>,
) -> Result<Json<HintView>, ApiError> {
    let hint = state.service.hint(&id, query.ai_difficulty).await?;
    Ok(Json(HintView::from(hint)))
}

#[instrument(skip(state))]
async fn game_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let game = state.service.get_game(&id).await?;
    Ok(Json(GameSnapshot::capture(&game, true)))
}
