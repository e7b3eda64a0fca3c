//! Recorded moves.
//!
//! A move is a domain event: once appended to a game's history it is never
//! changed or removed.

use crate::player::PlayerId;
use crate::position::Position;
use crate::types::Mark;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One accepted move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Move {
    position: Position,
    mark: Mark,
    player_id: PlayerId,
    move_number: u32,
    heuristic_value: f64,
    timestamp: DateTime<Utc>,
}

impl Move {
    /// Creates a move record.
    pub fn new(
        position: Position,
        mark: Mark,
        player_id: PlayerId,
        move_number: u32,
        heuristic_value: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            position,
            mark,
            player_id,
            move_number,
            heuristic_value,
            timestamp,
        }
    }

    /// Where the mark was placed.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Row-major index of the position.
    pub fn to_index(&self) -> usize {
        self.position.to_index()
    }

    /// The mark placed.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Who played it.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// 1-based position in the game's history.
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    /// Score recorded for the mover when the move was made.
    pub fn heuristic_value(&self) -> f64 {
        self.heuristic_value
    }

    /// When the move was accepted.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} ({}) -> {}",
            self.move_number, self.mark, self.player_id, self.position
        )
    }
}
