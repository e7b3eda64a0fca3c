//! Database models and their mapping to the game aggregate.

use std::str::FromStr;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tictactoe_engine::{
    AiDifficulty, Board, Game, GameMode, GameParts, GameStatus, Mark, Move, Player, PlayerId,
    Position,
};
use tracing::instrument;

use crate::db::{DbError, schema};

/// One row per game aggregate.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameRow {
    id: String,
    player_x_id: String,
    player_x_name: String,
    player_o_id: String,
    player_o_name: String,
    mode: String,
    board: String,
    status: String,
    next_player: String,
    move_count: i32,
    ai_difficulty: Option<String>,
    created_at: NaiveDateTime,
    finished_at: Option<NaiveDateTime>,
}

/// A stored move.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::moves)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MoveRow {
    id: i32,
    game_id: String,
    move_number: i32,
    position: i32,
    mark: String,
    player_id: String,
    heuristic_value: f64,
    played_at: NaiveDateTime,
}

/// Insertable move row; moves are only ever appended.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::moves)]
pub struct NewMoveRow {
    game_id: String,
    move_number: i32,
    position: i32,
    mark: String,
    player_id: String,
    heuristic_value: f64,
    played_at: NaiveDateTime,
}

impl GameRow {
    /// Flattens a game into its row. Moves are stored separately.
    #[instrument(skip(game), fields(game_id = %game.id()))]
    pub fn from_game(game: &Game) -> Self {
        Self {
            id: game.id().to_string(),
            player_x_id: game.player_x().id().to_string(),
            player_x_name: game.player_x().name().to_string(),
            player_o_id: game.player_o().id().to_string(),
            player_o_name: game.player_o().name().to_string(),
            mode: game.mode().to_string(),
            board: game.board().to_string(),
            status: game.status().to_string(),
            next_player: game.next_player().to_string(),
            move_count: game.move_count() as i32,
            ai_difficulty: game.ai_difficulty().map(|d| d.to_string()),
            created_at: game.created_at().naive_utc(),
            finished_at: game.finished_at().map(|t| t.naive_utc()),
        }
    }

    /// Rebuilds the aggregate from this row and its moves in order.
    ///
    /// # Errors
    ///
    /// Returns a mapping [`DbError`] if a column holds an unknown tag or the
    /// reassembled game breaks a game invariant.
    #[instrument(skip(self, moves), fields(game_id = %self.id, moves = moves.len()))]
    pub fn into_game(self, moves: Vec<MoveRow>) -> Result<Game, DbError> {
        let moves_history = moves
            .into_iter()
            .map(MoveRow::into_move)
            .collect::<Result<Vec<_>, _>>()?;

        let ai_difficulty = self
            .ai_difficulty
            .as_deref()
            .map(|d| parse_tag::<AiDifficulty>("ai_difficulty", d))
            .transpose()?;

        let move_count = u32::try_from(self.move_count)
            .map_err(|_| DbError::mapping(format!("Negative move_count {}", self.move_count)))?;

        let parts = GameParts {
            player_x: Player::new(player_id(&self.player_x_id)?, self.player_x_name, Mark::X),
            player_o: Player::new(player_id(&self.player_o_id)?, self.player_o_name, Mark::O),
            mode: parse_tag::<GameMode>("mode", &self.mode)?,
            board: parse_tag::<Board>("board", &self.board)?,
            status: parse_tag::<GameStatus>("status", &self.status)?,
            next_player: parse_mark(&self.next_player)?,
            move_count,
            moves_history,
            ai_difficulty,
            created_at: self.created_at.and_utc(),
            finished_at: self.finished_at.map(|t| t.and_utc()),
            id: self.id,
        };

        Game::restore(parts).map_err(|e| DbError::mapping(e.to_string()))
    }
}

impl MoveRow {
    fn into_move(self) -> Result<Move, DbError> {
        let index = usize::try_from(self.position)
            .map_err(|_| DbError::mapping(format!("Negative position {}", self.position)))?;
        let position =
            Position::from_index(index).map_err(|e| DbError::mapping(e.to_string()))?;
        let move_number = u32::try_from(self.move_number)
            .map_err(|_| DbError::mapping(format!("Negative move_number {}", self.move_number)))?;

        Ok(Move::new(
            position,
            parse_mark(&self.mark)?,
            player_id(&self.player_id)?,
            move_number,
            self.heuristic_value,
            self.played_at.and_utc(),
        ))
    }
}

impl NewMoveRow {
    /// Row for `mv` in game `game_id`.
    pub fn from_move(game_id: &str, mv: &Move) -> Self {
        Self::new(
            game_id.to_string(),
            mv.move_number() as i32,
            mv.to_index() as i32,
            mv.mark().to_string(),
            mv.player_id().to_string(),
            mv.heuristic_value(),
            mv.timestamp().naive_utc(),
        )
    }
}

fn parse_tag<T>(column: &str, value: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DbError::mapping(format!("Invalid {} '{}': {}", column, value, e)))
}

fn parse_mark(value: &str) -> Result<Mark, DbError> {
    let mut chars = value.chars();
    match (chars.next().and_then(Mark::from_char), chars.next()) {
        (Some(mark), None) => Ok(mark),
        _ => Err(DbError::mapping(format!("Invalid mark '{}'", value))),
    }
}

fn player_id(value: &str) -> Result<PlayerId, DbError> {
    PlayerId::new(value).map_err(|e| DbError::mapping(e.to_string()))
}
