//! Player symbols

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the two markers a peer plays as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The other symbol
    pub fn complement(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::X => 'X',
            Symbol::O => 'O',
        }
    }

    /// Parse the wire character for a symbol (`X` or `O`, uppercase only)
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'X' => Ok(Symbol::X),
            'O' => Ok(Symbol::O),
            other => Err(Error::InvalidSymbol(other)),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
