//! Board engine
//!
//! Pure game-state transitions and terminal-state evaluation for a 3×3 board.
//! Nothing here performs I/O; the match coordinator owns the only mutable copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Symbol;
use crate::error::{Error, Result};

/// Number of cells on the board
pub const CELL_COUNT: usize = 9;

/// Winning triples, row-major indexes
const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// A single board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Symbol),
}

impl Cell {
    /// Character used in board snapshots (`-`, `X`, `O`)
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => '-',
            Cell::Taken(symbol) => symbol.as_char(),
        }
    }

    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '-' => Ok(Cell::Empty),
            other => Symbol::from_char(other).map(Cell::Taken),
        }
    }
}

/// Terminal-state evaluation of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    Ongoing,
    Winner(Symbol),
    Tie,
}

impl Evaluation {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Evaluation::Ongoing)
    }
}

/// 3×3 board, row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell at `index`, or `None` when off the board
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Number of non-empty cells
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| **c != Cell::Empty).count()
    }

    pub fn is_full(&self) -> bool {
        self.filled() == CELL_COUNT
    }

    /// A move is valid when it names a cell in 0..=8 that is still empty
    pub fn is_valid_move(&self, position: i32) -> bool {
        usize::try_from(position)
            .ok()
            .and_then(|index| self.get(index))
            .is_some_and(|cell| cell == Cell::Empty)
    }

    /// Return a new board with `symbol` written at `position`
    pub fn apply_move(&self, symbol: Symbol, position: i32) -> Result<Board> {
        if !self.is_valid_move(position) {
            return Err(Error::InvalidMove { position });
        }
        let mut next = *self;
        next.cells[position as usize] = Cell::Taken(symbol);
        Ok(next)
    }

    /// Winner as soon as one triple is held by one symbol, tie only on a full board
    pub fn evaluate(&self) -> Evaluation {
        for [a, b, c] in LINES {
            if let Cell::Taken(symbol) = self.cells[a] {
                if self.cells[b] == self.cells[a] && self.cells[c] == self.cells[a] {
                    return Evaluation::Winner(symbol);
                }
            }
        }

        if self.is_full() {
            Evaluation::Tie
        } else {
            Evaluation::Ongoing
        }
    }

    /// Contents of each of the eight winning triples
    pub fn lines(&self) -> impl Iterator<Item = [Option<Symbol>; 3]> + '_ {
        LINES.iter().map(move |line| {
            line.map(|i| match self.cells[i] {
                Cell::Taken(symbol) => Some(symbol),
                Cell::Empty => None,
            })
        })
    }

    /// Nine characters, no separators
    pub fn to_wire(&self) -> String {
        self.cells.iter().map(|c| c.as_char()).collect()
    }

    pub fn from_wire(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != CELL_COUNT {
            return Err(Error::InvalidBoard(format!(
                "expected {} cells, got {}",
                CELL_COUNT,
                chars.len()
            )));
        }

        let mut cells = [Cell::Empty; CELL_COUNT];
        for (slot, c) in cells.iter_mut().zip(chars) {
            *slot = Cell::from_char(c)
                .map_err(|_| Error::InvalidBoard(format!("bad cell {:?}", c)))?;
        }
        Ok(Self { cells })
    }
}

/// Renders the board as three rows of three
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(3) {
            let line: Vec<String> = row.iter().map(|c| c.as_char().to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
