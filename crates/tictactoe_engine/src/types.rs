//! Core domain types for tic-tac-toe.

use crate::error::GameError;
use serde::{Deserialize, Serialize};

/// Character used for an empty cell in every board string.
pub const EMPTY_MARKER: char = '.';

/// Content of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Mark {
    /// Nobody has played here yet.
    #[default]
    Empty,
    /// Player X (goes first).
    X,
    /// Player O (goes second).
    O,
}

impl Mark {
    /// Returns the other player's mark. `Empty` stays `Empty`.
    pub fn opposite(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
            Mark::Empty => Mark::Empty,
        }
    }

    /// Returns true for `Empty`.
    pub fn is_empty(self) -> bool {
        self == Mark::Empty
    }

    /// Single-character form used by board strings.
    pub fn as_char(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
            Mark::Empty => EMPTY_MARKER,
        }
    }

    /// Parses the single-character form.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Mark::X),
            'O' => Some(Mark::O),
            EMPTY_MARKER => Some(Mark::Empty),
            _ => None,
        }
    }
}

impl From<Mark> for char {
    fn from(mark: Mark) -> Self {
        mark.as_char()
    }
}

impl TryFrom<char> for Mark {
    type Error = GameError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Mark::from_char(c).ok_or_else(|| GameError::MalformedSerialization {
            input: c.to_string(),
            reason: format!("unknown mark character {c:?}"),
        })
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Current phase of a game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum GameStatus {
    /// Moves are still being accepted.
    #[serde(rename = "IN_PROGRESS")]
    #[strum(serialize = "IN_PROGRESS")]
    InProgress,
    /// X completed a line.
    #[serde(rename = "X_WON")]
    #[strum(serialize = "X_WON")]
    XWon,
    /// O completed a line.
    #[serde(rename = "O_WON")]
    #[strum(serialize = "O_WON")]
    OWon,
    /// Nine moves, no line.
    #[serde(rename = "DRAW")]
    #[strum(serialize = "DRAW")]
    Draw,
}

impl GameStatus {
    /// True for every status except `InProgress`.
    pub fn is_finished(self) -> bool {
        self != GameStatus::InProgress
    }

    /// Mark that won, if any.
    pub fn winner(self) -> Option<Mark> {
        match self {
            GameStatus::XWon => Some(Mark::X),
            GameStatus::OWon => Some(Mark::O),
            GameStatus::InProgress | GameStatus::Draw => None,
        }
    }

    /// Status for a win by `mark`. `Empty` has no win status.
    pub fn won_by(mark: Mark) -> Option<Self> {
        match mark {
            Mark::X => Some(GameStatus::XWon),
            Mark::O => Some(GameStatus::OWon),
            Mark::Empty => None,
        }
    }
}

/// Who plays against whom.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    /// Two human players.
    PvP,
    /// Human X against the AI as O.
    PvAI,
}

/// Strength requested from the AI player.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AiDifficulty {
    /// Weakest setting.
    Easy,
    /// Default setting.
    #[default]
    Medium,
    /// Strongest setting.
    Hard,
}
