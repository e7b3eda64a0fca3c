//! Database persistence layer for games and their moves.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::{DbError, DbErrorKind};
pub use models::{GameRow, MoveRow, NewMoveRow};
pub use repository::{GameRepository, MIGRATIONS};
