//! Authoritative state of one match

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Board, Evaluation, Symbol};
use crate::error::{Error, Result};

/// Board plus turn bookkeeping, mutated once per accepted move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    board: Board,
    active: Symbol,
    move_count: u8,
}

impl MatchState {
    /// Empty board with `first` to move
    pub fn new(first: Symbol) -> Self {
        Self {
            board: Board::new(),
            active: first,
            move_count: 0,
        }
    }

    /// Empty board with the first symbol picked by an unbiased coin flip
    pub fn coin_flip<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first = if rng.gen_bool(0.5) { Symbol::X } else { Symbol::O };
        Self::new(first)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Symbol {
        self.active
    }

    pub fn move_count(&self) -> u8 {
        self.move_count
    }

    pub fn is_valid_move(&self, position: i32) -> bool {
        self.board.is_valid_move(position)
    }

    /// Apply the active symbol's move, then hand the turn over.
    /// Invalid moves leave the state untouched.
    pub fn play(&mut self, position: i32) -> Result<Evaluation> {
        if !self.board.is_valid_move(position) {
            return Err(Error::InvalidMove { position });
        }
        self.board = self.board.apply_move(self.active, position)?;
        self.active = self.active.complement();
        self.move_count += 1;

        crate::invariants::assert_match_invariants(self);

        Ok(self.board.evaluate())
    }

    pub fn evaluate(&self) -> Evaluation {
        self.board.evaluate()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_first_move_flips_turn() {
        let mut state = MatchState::new(Symbol::X);
        let eval = state.play(4).unwrap();

        assert_eq!(eval, Evaluation::Ongoing);
        assert_eq!(state.board().to_wire(), "----X----");
        assert_eq!(state.active(), Symbol::O);
        assert_eq!(state.move_count(), 1);
    }

    #[test]
    fn test_invalid_move_does_not_mutate() {
        let mut state = MatchState::new(Symbol::O);
        state.play(0).unwrap();
        let before = state.clone();

        for _ in 0..5 {
            assert!(state.play(0).is_err());
            assert!(state.play(9).is_err());
            assert!(state.play(-3).is_err());
        }
        assert_eq!(state, before);
    }

    #[test]
    fn test_move_count_tracks_filled_cells() {
        let mut state = MatchState::new(Symbol::X);
        // X O X / X O O / O X X, no line until the end
        for pos in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
            assert_eq!(state.move_count() as usize, state.board().filled());
            state.play(pos).unwrap();
        }
        assert_eq!(state.move_count(), 9);
        assert_eq!(state.evaluate(), Evaluation::Tie);
    }

    #[test]
    fn test_coin_flip_produces_both_symbols() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen_x = false;
        let mut seen_o = false;
        for _ in 0..64 {
            match MatchState::coin_flip(&mut rng).active() {
                Symbol::X => seen_x = true,
                Symbol::O => seen_o = true,
            }
        }
        assert!(seen_x && seen_o);
    }
}
