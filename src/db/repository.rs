//! Database repository for game aggregates and their move history.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tictactoe_engine::Game;
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, GameRow, MoveRow, NewMoveRow, schema};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for games.
///
/// Each call opens its own connection, so the repository is cheap to clone
/// and safe to hand to blocking tasks.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// Use `":memory:"` only for single-call checks; every call reconnects.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Path or URL this repository connects to.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection with foreign keys enforced.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut conn)?;
        Ok(conn)
    }

    /// Applies pending migrations and returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;

        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Inserts or updates a game and appends its new moves, atomically.
    ///
    /// Moves already stored are never rewritten. Saving a copy of the game
    /// that has fewer moves than the stored one is rejected.
    ///
    /// # Errors
    ///
    /// Returns a conflict [`DbError`] for a stale copy, or a query error.
    #[instrument(skip(self, game), fields(game_id = %game.id(), move_count = game.move_count()))]
    pub fn save(&self, game: &Game) -> Result<(), DbError> {
        self.write(game, None)
    }

    /// Like [`save`](Self::save), but only if the stored game still has
    /// `expected_move_count` moves, i.e. nobody else moved since it was loaded.
    ///
    /// # Errors
    ///
    /// Returns a conflict [`DbError`] if the stored count differs.
    #[instrument(skip(self, game), fields(game_id = %game.id(), move_count = game.move_count()))]
    pub fn save_if_unchanged(&self, game: &Game, expected_move_count: u32) -> Result<(), DbError> {
        self.write(game, Some(expected_move_count))
    }

    fn write(&self, game: &Game, expected_move_count: Option<u32>) -> Result<(), DbError> {
        debug!("Saving game");
        let mut conn = self.connection()?;
        let row = GameRow::from_game(game);

        let appended = conn.transaction::<_, DbError, _>(|conn| {
            let stored = schema::games::table
                .filter(schema::games::id.eq(game.id()))
                .select(schema::games::move_count)
                .first::<i32>(conn)
                .optional()?
                .unwrap_or(0);

            if let Some(expected) = expected_move_count.filter(|e| i64::from(*e) != i64::from(stored)) {
                warn!(stored, expected, "Concurrent game update rejected");
                return Err(DbError::conflict(format!(
                    "Game '{}' has {} stored moves, expected {}",
                    game.id(),
                    stored,
                    expected
                )));
            }

            let stored = usize::try_from(stored).unwrap_or(0);
            if stored > game.moves_history().len() {
                warn!(stored, incoming = game.moves_history().len(), "Stale game save rejected");
                return Err(DbError::conflict(format!(
                    "Game '{}' has {} stored moves, refusing to save {}",
                    game.id(),
                    stored,
                    game.moves_history().len()
                )));
            }

            diesel::insert_into(schema::games::table)
                .values(&row)
                .on_conflict(schema::games::id)
                .do_update()
                .set(&row)
                .execute(conn)?;

            let new_moves: Vec<NewMoveRow> = game
                .moves_history()
                .iter()
                .skip(stored)
                .map(|mv| NewMoveRow::from_move(game.id(), mv))
                .collect();

            if !new_moves.is_empty() {
                diesel::insert_into(schema::moves::table)
                    .values(&new_moves)
                    .execute(conn)?;
            }

            Ok(new_moves.len())
        })?;

        info!(appended, status = %game.status(), "Game saved");
        Ok(())
    }

    /// Loads a game by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on query failure or if the stored rows do not
    /// describe a valid game.
    #[instrument(skip(self))]
    pub fn find_by_id(&self, game_id: &str) -> Result<Option<Game>, DbError> {
        debug!("Loading game");
        let mut conn = self.connection()?;

        let Some(row) = schema::games::table
            .filter(schema::games::id.eq(game_id))
            .select(GameRow::as_select())
            .first::<GameRow>(&mut conn)
            .optional()?
        else {
            debug!("Game not found");
            return Ok(None);
        };

        let moves = schema::moves::table
            .filter(schema::moves::game_id.eq(game_id))
            .order(schema::moves::move_number.asc())
            .select(MoveRow::as_select())
            .load::<MoveRow>(&mut conn)?;

        let game = row.into_game(moves)?;
        debug!(status = %game.status(), move_count = game.move_count(), "Game loaded");
        Ok(Some(game))
    }

    /// Lists the most recently created games, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on query or mapping failure.
    #[instrument(skip(self))]
    pub fn list(&self, limit: i64) -> Result<Vec<Game>, DbError> {
        debug!("Listing games");
        let mut conn = self.connection()?;

        let rows = schema::games::table
            .order(schema::games::created_at.desc())
            .limit(limit)
            .select(GameRow::as_select())
            .load::<GameRow>(&mut conn)?;

        let ids: Vec<&str> = rows.iter().map(|row| row.id().as_str()).collect();
        let mut moves_by_game: HashMap<String, Vec<MoveRow>> = HashMap::new();
        for mv in schema::moves::table
            .filter(schema::moves::game_id.eq_any(ids))
            .order((schema::moves::game_id.asc(), schema::moves::move_number.asc()))
            .select(MoveRow::as_select())
            .load::<MoveRow>(&mut conn)?
        {
            moves_by_game.entry(mv.game_id().clone()).or_default().push(mv);
        }

        let games = rows
            .into_iter()
            .map(|row| {
                let moves = moves_by_game.remove(row.id()).unwrap_or_default();
                row.into_game(moves)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = games.len(), "Games listed");
        Ok(games)
    }

    /// Deletes a game and its moves. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete(&self, game_id: &str) -> Result<bool, DbError> {
        let mut conn = self.connection()?;

        let deleted = conn.transaction::<_, DbError, _>(|conn| {
            diesel::delete(schema::moves::table.filter(schema::moves::game_id.eq(game_id)))
                .execute(conn)?;
            let games =
                diesel::delete(schema::games::table.filter(schema::games::id.eq(game_id)))
                    .execute(conn)?;
            Ok(games > 0)
        })?;

        if deleted {
            info!("Game deleted");
        } else {
            debug!("Nothing to delete");
        }
        Ok(deleted)
    }
}
