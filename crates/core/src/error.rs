//! Error types for Noughts Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid move: position {position}")]
    InvalidMove { position: i32 },

    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(char),

    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
