//! Database error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong at the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DbErrorKind {
    /// Connection, query or migration failure.
    #[display("query")]
    Query,
    /// A stored row could not be turned back into a game.
    #[display("mapping")]
    Mapping,
    /// A stale copy of a game was saved over a newer one.
    #[display("conflict")]
    Conflict,
}

/// Database error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Database {} error: {} at {}:{}", kind, message, file, line)]
pub struct DbError {
    /// Error category.
    pub kind: DbErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates a new query error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(DbErrorKind::Query, message)
    }

    /// Creates a mapping error for a row that does not describe a valid game.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::with_kind(DbErrorKind::Mapping, message)
    }

    /// Creates a conflict error for a stale write.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(DbErrorKind::Conflict, message)
    }

    #[track_caller]
    fn with_kind(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}
