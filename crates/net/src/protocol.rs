//! Network protocol message types
//!
//! Messages are short ASCII frames. In fixed framing each kind has a
//! length known to both sides:
//!
//! | Kind       | Bytes | Format       |
//! |------------|-------|--------------|
//! | Connect    | 2     | `00`         |
//! | Choice     | 2     | `02`         |
//! | Choose     | 4     | `01 X`       |
//! | Assign     | 2     | `0X`         |
//! | Reject     | 10    | `061 REJECT` |
//! | Start      | 2     | `05`         |
//! | Board      | 12    | `13 ---------` |
//! | Turn       | 4     | `11 X`       |
//! | Move       | 4     | `10 4`       |
//! | GameOver   | 2     | `14`         |
//! | Won/Lost/Tie | 2   | `20`/`21`/`15` |
//! | Disconnect | 2     | `22`         |

use noughts_core::{Board, Symbol};

use crate::error::{Error, Result};

/// Every frame starts with a 2-byte head
pub const HEAD_LEN: usize = 2;

/// Fixed-mode byte lengths of the client-to-server frames
pub const CONNECT_LEN: usize = 2;
pub const CHOOSE_LEN: usize = 4;
pub const MOVE_LEN: usize = 4;

const REJECT: &[u8] = b"061 REJECT";

/// Protocol messages, both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Client asks to join
    Connect,
    /// First peer may pick a symbol
    Choice,
    /// First peer's picked symbol
    Choose(Symbol),
    /// Final symbol assignment
    Assign(Symbol),
    /// Malformed registration
    Reject,
    /// Match begins
    Start,
    /// Full board snapshot
    Board(Board),
    /// It is this symbol's turn
    Turn(Symbol),
    /// Chosen cell index. Fixed framing only carries one digit; prefixed
    /// framing may carry any integer, which the board engine then rejects.
    Move(i32),
    /// Match has ended
    GameOver,
    Won,
    Lost,
    Tie,
    /// Final goodbye before the connection closes
    Disconnect,
}

impl Message {
    /// Wire bytes for this message
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Connect => b"00".to_vec(),
            Message::Choice => b"02".to_vec(),
            Message::Choose(s) => format!("01 {}", s).into_bytes(),
            Message::Assign(s) => format!("0{}", s).into_bytes(),
            Message::Reject => REJECT.to_vec(),
            Message::Start => b"05".to_vec(),
            Message::Board(board) => format!("13 {}", board.to_wire()).into_bytes(),
            Message::Turn(s) => format!("11 {}", s).into_bytes(),
            Message::Move(index) => format!("10 {}", index).into_bytes(),
            Message::GameOver => b"14".to_vec(),
            Message::Won => b"20".to_vec(),
            Message::Lost => b"21".to_vec(),
            Message::Tie => b"15".to_vec(),
            Message::Disconnect => b"22".to_vec(),
        }
    }

    /// Parse a complete frame
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| Error::Protocol(format!("Non-ASCII frame: {:?}", bytes)))?;

        let msg = match text {
            "00" => Message::Connect,
            "02" => Message::Choice,
            "05" => Message::Start,
            "14" => Message::GameOver,
            "20" => Message::Won,
            "21" => Message::Lost,
            "15" => Message::Tie,
            "22" => Message::Disconnect,
            "0X" => Message::Assign(Symbol::X),
            "0O" => Message::Assign(Symbol::O),
            _ if bytes == REJECT => Message::Reject,
            _ => match (text.get(..3), text.get(3..)) {
                (Some("01 "), Some(rest)) => Message::Choose(single_symbol(rest)?),
                (Some("11 "), Some(rest)) => Message::Turn(single_symbol(rest)?),
                (Some("13 "), Some(rest)) => Message::Board(Board::from_wire(rest)?),
                (Some("10 "), Some(rest)) => Message::Move(rest.parse().map_err(|_| {
                    Error::Protocol(format!("Bad move index: {:?}", rest))
                })?),
                _ => return Err(Error::Protocol(format!("Unknown frame: {:?}", text))),
            },
        };
        Ok(msg)
    }
}

fn single_symbol(s: &str) -> Result<Symbol> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Symbol::from_char(c)?),
        _ => Err(Error::Protocol(format!("Bad symbol: {:?}", s))),
    }
}

/// Total fixed-mode length of a server-to-client frame, given its head
pub fn server_frame_len(head: &[u8]) -> usize {
    match head {
        b"11" => 4,
        b"13" => 12,
        b"06" => REJECT.len(),
        _ => HEAD_LEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_lengths() {
        assert_eq!(Message::Connect.encode().len(), CONNECT_LEN);
        assert_eq!(Message::Choose(Symbol::O).encode().len(), CHOOSE_LEN);
        assert_eq!(Message::Move(8).encode().len(), MOVE_LEN);
        assert_eq!(Message::Board(Board::new()).encode().len(), 12);
        assert_eq!(Message::Turn(Symbol::X).encode().len(), 4);
        assert_eq!(Message::Reject.encode().len(), 10);
        for msg in [Message::Won, Message::Lost, Message::Tie, Message::Disconnect] {
            assert_eq!(msg.encode().len(), 2);
        }
    }

    #[test]
    fn test_wire_text() {
        assert_eq!(Message::Assign(Symbol::X).encode(), b"0X");
        assert_eq!(Message::Turn(Symbol::O).encode(), b"11 O");
        assert_eq!(Message::Tie.encode(), b"15");
        let board = Board::new().apply_move(Symbol::X, 4).unwrap();
        assert_eq!(Message::Board(board).encode(), b"13 ----X----");
    }

    #[test]
    fn test_decode_client_frames() {
        assert_eq!(Message::decode(b"00").unwrap(), Message::Connect);
        assert_eq!(Message::decode(b"01 O").unwrap(), Message::Choose(Symbol::O));
        assert_eq!(Message::decode(b"10 7").unwrap(), Message::Move(7));
        assert_eq!(Message::decode(b"10 -1").unwrap(), Message::Move(-1));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(Message::decode(b"01 x").is_err());
        assert!(Message::decode(b"01 XO").is_err());
        assert!(Message::decode(b"10 a").is_err());
        assert!(Message::decode(b"99").is_err());
        assert!(Message::decode(b"13 ---").is_err());
        assert!(Message::decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_server_frame_len() {
        assert_eq!(server_frame_len(b"11"), 4);
        assert_eq!(server_frame_len(b"13"), 12);
        assert_eq!(server_frame_len(b"06"), 10);
        assert_eq!(server_frame_len(b"0X"), 2);
        assert_eq!(server_frame_len(b"22"), 2);
    }
}
