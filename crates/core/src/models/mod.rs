//! Data models for Noughts

mod board;
mod game;
mod report;
mod symbol;

pub use board::*;
pub use game::*;
pub use report::*;
pub use symbol::*;
