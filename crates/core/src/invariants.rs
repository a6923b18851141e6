//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Board, Evaluation, MatchState, Symbol};

/// Validate that a match's bookkeeping agrees with its board
pub fn assert_match_invariants(state: &MatchState) {
    debug_assert!(
        state.move_count() as usize == state.board().filled(),
        "move_count {} but {} cells are filled",
        state.move_count(),
        state.board().filled()
    );

    assert_board_invariants(state.board());
}

/// Validate that a board has a single, consistent terminal reading
pub fn assert_board_invariants(board: &Board) {
    if cfg!(debug_assertions) {
        let x_wins = board
            .lines()
            .any(|line| line == [Some(Symbol::X); 3]);
        let o_wins = board
            .lines()
            .any(|line| line == [Some(Symbol::O); 3]);

        debug_assert!(
            !(x_wins && o_wins),
            "board {} has winning lines for both symbols",
            board.to_wire()
        );

        if x_wins || o_wins {
            debug_assert!(
                board.evaluate() != Evaluation::Tie,
                "board {} reports a tie despite a winning line",
                board.to_wire()
            );
        }
    }
}

/// Validate that two registered peers hold complementary symbols
pub fn assert_symbols_complementary(first: Symbol, second: Symbol) {
    debug_assert!(
        first.complement() == second,
        "peers registered with duplicate symbol {}",
        first
    );
}
