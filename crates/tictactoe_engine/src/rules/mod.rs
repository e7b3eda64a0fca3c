//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board). Rules know nothing about
//! whose turn it is or whether a game has been marked finished; the
//! [`Game`](crate::Game) state machine owns those checks.

mod heuristic;
mod status;
mod win;

pub use heuristic::calculate_heuristic;
pub use status::{calculate_status, get_legal_moves, is_valid_move};
pub use win::{WIN_LINES, calculate_winner};
