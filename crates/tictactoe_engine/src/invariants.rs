//! First-class invariants for a game aggregate.
//!
//! Each invariant is a logical property of [`Game`] that holds after every
//! accepted move. They are checked in debug builds after each move and
//! always when a game is restored from stored parts.

use crate::rules::calculate_status;
use crate::{Game, Mark};
use tracing::warn;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn check<S, I: Invariant<S>>(state: &S, violations: &mut Vec<InvariantViolation>) {
    if !I::holds(state) {
        warn!(invariant = I::description(), "Invariant violated");
        violations.push(InvariantViolation::new(I::description()));
    }
}

impl<S, I1, I2, I3, I4> InvariantSet<S> for (I1, I2, I3, I4)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
    I4: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        check::<S, I3>(state, &mut violations);
        check::<S, I4>(state, &mut violations);
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

/// X moves after an even number of moves, O after an odd number, while the
/// game is running. A finished game keeps the mark of the final mover.
pub struct AlternatingTurnInvariant;

impl Invariant<Game> for AlternatingTurnInvariant {
    fn holds(game: &Game) -> bool {
        if game.status().is_finished() {
            return game
                .moves_history()
                .last()
                .is_some_and(|last| last.mark() == game.next_player());
        }
        let expected = if game.move_count() % 2 == 0 { Mark::X } else { Mark::O };
        game.next_player() == expected
    }

    fn description() -> &'static str {
        "Players alternate, starting with X"
    }
}

/// History has one entry per move, numbered from 1, alternating marks, each
/// played by the seat owning the mark and still visible on the board.
pub struct HistoryConsistentInvariant;

impl Invariant<Game> for HistoryConsistentInvariant {
    fn holds(game: &Game) -> bool {
        let history = game.moves_history();
        if history.len() != game.move_count() as usize {
            return false;
        }
        history.iter().enumerate().all(|(i, mv)| {
            let expected_mark = if i % 2 == 0 { Mark::X } else { Mark::O };
            mv.move_number() as usize == i + 1
                && mv.mark() == expected_mark
                && game.player_for(mv.mark()).is_some_and(|p| p.id() == mv.player_id())
                && game.board().get_cell(mv.position()) == mv.mark()
        })
    }

    fn description() -> &'static str {
        "History matches move count and board"
    }
}

/// Filled cells equal the move count and X leads O by at most one.
pub struct BoardFillInvariant;

impl Invariant<Game> for BoardFillInvariant {
    fn holds(game: &Game) -> bool {
        let x = game.board().count(Mark::X);
        let o = game.board().count(Mark::O);
        x + o == game.move_count() as usize && (x == o || x == o + 1)
    }

    fn description() -> &'static str {
        "Filled cells match move count"
    }
}

/// Status is derived from the board, and a finish time exists exactly when
/// the status is terminal.
pub struct StatusConsistentInvariant;

impl Invariant<Game> for StatusConsistentInvariant {
    fn holds(game: &Game) -> bool {
        game.status() == calculate_status(game.board(), game.move_count())
            && game.finished_at().is_some() == game.status().is_finished()
    }

    fn description() -> &'static str {
        "Status matches board"
    }
}

/// Every invariant a game must satisfy.
pub type GameInvariants = (
    AlternatingTurnInvariant,
    HistoryConsistentInvariant,
    BoardFillInvariant,
    StatusConsistentInvariant,
);
