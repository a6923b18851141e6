//! Interactive player reading from stdin

use std::io::{self, BufRead, Write};

use noughts_core::{Board, Symbol};
use noughts_net::{ClientEvent, Error, Player, Result};

/// Prompts the user on the terminal
pub struct ConsolePlayer<R> {
    input: R,
}

impl ConsolePlayer<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> ConsolePlayer<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Prompt until `parse` accepts a line
    fn ask<T>(&mut self, prompt: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
        loop {
            print!("{}", prompt);
            io::stdout().flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed",
                )));
            }
            if let Some(value) = parse(line.trim()) {
                return Ok(value);
            }
        }
    }
}

impl<R: BufRead> Player for ConsolePlayer<R> {
    fn choose_symbol(&mut self) -> Result<Symbol> {
        self.ask("choose X or O: ", parse_symbol)
    }

    fn choose_move(&mut self, _board: &Board, me: Symbol) -> Result<i32> {
        self.ask(&format!("{}: Choose move [0-8]: ", me), parse_cell)
    }

    fn notify(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::Assigned(symbol) => println!("You are: {}", symbol),
            ClientEvent::Started => println!("Game starting"),
            ClientEvent::BoardUpdated(board) => println!("\n{}", board),
            ClientEvent::Turn { active, mine: false } => {
                println!("Waiting for player {}", active);
            }
            ClientEvent::Turn { mine: true, .. } => {}
            ClientEvent::GameOver => println!("Game over"),
        }
    }
}

fn parse_symbol(s: &str) -> Option<Symbol> {
    match s {
        "X" => Some(Symbol::X),
        "O" => Some(Symbol::O),
        _ => None,
    }
}

fn parse_cell(s: &str) -> Option<i32> {
    s.parse().ok().filter(|i| (0..=8).contains(i))
}
