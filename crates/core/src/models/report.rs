//! Summary of a finished match

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Evaluation, Symbol};

/// Written once per completed match, after teardown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Connection id of the peer playing X
    pub x_peer: Uuid,
    /// Connection id of the peer playing O
    pub o_peer: Uuid,
    pub first_turn: Symbol,
    /// Accepted cell indexes, in order
    pub moves: Vec<u8>,
    /// Rejected move attempts across the whole match
    pub invalid_moves: u32,
    pub result: Evaluation,
}

impl MatchReport {
    /// Symbol of the peer that won, if any
    pub fn winner(&self) -> Option<Symbol> {
        match self.result {
            Evaluation::Winner(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Serialize as a single JSON line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
