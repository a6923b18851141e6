//! Network error types

use std::io;

use noughts_core::Symbol;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Registration rejected: {0}")]
    Rejected(String),

    #[error("Timed out during {0}")]
    Timeout(&'static str),

    #[error("Server shutting down")]
    Shutdown,

    #[error("Too many invalid moves from {symbol}: {attempts}")]
    TooManyInvalidMoves { symbol: Symbol, attempts: u32 },

    #[error(transparent)]
    Core(#[from] noughts_core::Error),
}

impl Error {
    /// Whether the failure means the peer's connection can no longer be used
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Io(_) | Error::ShortRead { .. })
    }
}
