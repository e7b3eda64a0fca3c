//! Tic-tac-toe game service.
//!
//! Wraps the [`tictactoe_engine`] rules with storage, an AI opponent and a
//! REST API.
//!
//! # Architecture
//!
//! - **Engine**: board, rules and the game state machine (re-exported below)
//! - **Db**: SQLite persistence of games and their append-only move log
//! - **AI**: local chooser or remote AI service behind [`AiService`]
//! - **Platform**: best-effort move and result notifications
//! - **Service**: [`GameService`] use cases
//! - **Server**: axum routes over the service
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tictactoe_service::{
//!     AiDifficulty, DisabledPlatform, GameRepository, GameService, LocalAiService, RandomMove,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let repository = GameRepository::new("games.db".to_string())?;
//! repository.run_migrations()?;
//!
//! let service = GameService::new(
//!     repository,
//!     Arc::new(LocalAiService::new(Arc::new(RandomMove::new()))),
//!     Arc::new(DisabledPlatform),
//!     AiDifficulty::Medium,
//! );
//! let app = tictactoe_service::router(service);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod ai_service;
mod config;
mod db;
mod game_service;
mod platform;
mod server;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServiceConfig};

// Crate-level exports - Persistence
pub use db::{DbError, DbErrorKind, GameRepository, GameRow, MIGRATIONS, MoveRow, NewMoveRow};

// Crate-level exports - AI providers
pub use ai_service::{AiError, AiMove, AiService, DEFAULT_EVALUATION, HttpAiService, LocalAiService};

// Crate-level exports - Platform notifications
pub use platform::{
    DisabledPlatform, FinalResult, HttpPlatformService, MoveLogEntry, PlatformError,
    PlatformService, ResultMove,
};

// Crate-level exports - Application service
pub use game_service::{
    CreateGameCommand, DEFAULT_LIST_LIMIT, GameService, Hint, MAX_LIST_LIMIT, MoveOutcome,
    PlayMoveCommand, ServiceError,
};

// Crate-level exports - REST API
pub use server::{
    AiMoveRequest, ApiError, ApiJson, ApiQuery, AppState, GameView, HintQuery, HintView,
    ListQuery, MoveResponse, MoveView, PlayMoveRequest, PlayerView, router,
};

// Crate-level exports - Engine types
pub use tictactoe_engine::{
    AiDifficulty, Board, FirstLegalMove, Game, GameError, GameMode, GameSnapshot, GameStatus,
    Mark, Move, MoveChooser, NewPlayer, Player, PlayerId, Position, RandomMove,
};
