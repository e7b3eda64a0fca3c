//! Player identities.

use crate::error::GameError;
use crate::types::Mark;
use serde::{Deserialize, Serialize};

/// Reserved identifier of the AI player.
pub const AI_PLAYER_ID: &str = "AI";

/// Non-blank player identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPlayerId`] if `value` is empty or blank.
    pub fn new(value: impl Into<String>) -> Result<Self, GameError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(GameError::InvalidPlayerId(value));
        }
        Ok(Self(value))
    }

    /// The AI identity.
    pub fn ai() -> Self {
        Self(AI_PLAYER_ID.to_string())
    }

    /// True for the AI identity.
    pub fn is_ai(&self) -> bool {
        self.0 == AI_PLAYER_ID
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PlayerId::new(value)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

/// A seat at the board: identity, display name and mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    mark: Mark,
}

impl Player {
    /// Creates a player.
    pub fn new(id: PlayerId, name: impl Into<String>, mark: Mark) -> Self {
        Self {
            id,
            name: name.into(),
            mark,
        }
    }

    /// Player's identifier.
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mark this player places.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// True for the AI identity.
    pub fn is_ai(&self) -> bool {
        self.id.is_ai()
    }
}

/// Identity and optional name for a seat in a new game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub(crate) id: String,
    pub(crate) name: Option<String>,
}

impl NewPlayer {
    /// A player with an explicit display name.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// A player that gets the default name for its seat.
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    /// Creates a player from an id and optional name.
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    pub(crate) fn into_player(self, mark: Mark, default_name: &str) -> Result<Player, GameError> {
        let id = PlayerId::new(self.id)?;
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_name.to_string());
        Ok(Player::new(id, name, mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_id_rejected() {
        assert!(matches!(PlayerId::new(""), Err(GameError::InvalidPlayerId(_))));
        assert!(matches!(PlayerId::new("   "), Err(GameError::InvalidPlayerId(_))));
        assert!(serde_json::from_str::<PlayerId>("\"\"").is_err());
    }

    #[test]
    fn test_ai_identity() {
        assert!(PlayerId::ai().is_ai());
        assert!(PlayerId::new("AI").unwrap().is_ai());
        assert!(!PlayerId::new("ai-fan").unwrap().is_ai());
    }

    #[test]
    fn test_default_name() {
        let player = NewPlayer::new("p1", Some(" ".to_string()))
            .into_player(Mark::X, "Player X")
            .unwrap();
        assert_eq!(player.name(), "Player X");
        assert_eq!(player.mark(), Mark::X);
    }
}
