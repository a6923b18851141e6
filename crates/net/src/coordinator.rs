//! Match coordinator
//!
//! Owns the authoritative board and both session peers for a single match
//! and drives the protocol from registration to teardown:
//!
//! ```text
//! RegisteringFirst ─┐
//!                   ├─> RegisteringSecond -> Starting -> AwaitingMove <─┐
//! (concurrent) ─────┘                                     │            │
//!                                                   ApplyingMove ──────┤ invalid
//!                                                         │            │
//!                                                   Broadcasting       │
//!                                                         │            │
//!                                                    Evaluating ───────┘ ongoing
//!                                                         │
//!                                                     GameOver -> Teardown
//! ```
//!
//! Only the peer holding the active symbol is ever read from during play.
//! Every broadcast completes before the next read.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use noughts_core::invariants::assert_symbols_complementary;
use noughts_core::{Evaluation, MatchReport, MatchState, ServerConfig, Symbol};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::peer::SessionPeer;
use crate::protocol::Message;

/// Protocol phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    RegisteringFirst,
    RegisteringSecond,
    Starting,
    AwaitingMove,
    ApplyingMove,
    Broadcasting,
    Evaluating,
    GameOver,
    Teardown,
}

/// Limits applied to a single match
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub registration_timeout: Option<Duration>,
    pub move_timeout: Option<Duration>,
    /// Consecutive invalid moves tolerated in one turn
    pub max_invalid_moves: u32,
}

impl MatchOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            registration_timeout: config.registration_timeout(),
            move_timeout: config.move_timeout(),
            max_invalid_moves: config.max_invalid_moves,
        }
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

pub struct Coordinator<S> {
    match_id: Uuid,
    first: SessionPeer<S>,
    second: SessionPeer<S>,
    options: MatchOptions,
    first_turn: Option<Symbol>,
    phase: Phase,
    invalid_moves: u32,
    shutdown: Option<broadcast::Receiver<()>>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Coordinator<S> {
    pub fn new(first: SessionPeer<S>, second: SessionPeer<S>, options: MatchOptions) -> Self {
        Self {
            match_id: Uuid::new_v4(),
            first,
            second,
            options,
            first_turn: None,
            phase: Phase::RegisteringFirst,
            invalid_moves: 0,
            shutdown: None,
        }
    }

    /// Skip the coin flip and let `symbol` move first
    pub fn with_first_turn(mut self, symbol: Symbol) -> Self {
        self.first_turn = Some(symbol);
        self
    }

    /// Abandon the match when `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    /// Drive the match to completion.
    ///
    /// Both peers are always sent DISCONNECT (when their connection still
    /// works) and closed before this returns, whether the match finished or
    /// was abandoned, including on shutdown.
    pub async fn run(mut self) -> Result<MatchReport> {
        info!(
            match_id = %self.match_id,
            first = %self.first.id(),
            first_addr = ?self.first.addr(),
            second = %self.second.id(),
            second_addr = ?self.second.addr(),
            "Match assembling"
        );

        let mut shutdown = self.shutdown.take();
        let result = tokio::select! {
            result = self.drive() => result,
            _ = shutdown_requested(shutdown.as_mut()) => Err(Error::Shutdown),
        };
        if let Err(e) = &result {
            warn!(match_id = %self.match_id, phase = ?self.phase, error = %e, "Abandoning match");
        }

        self.enter(Phase::Teardown);
        self.first.disconnect().await;
        self.second.disconnect().await;

        result
    }

    async fn drive(&mut self) -> Result<MatchReport> {
        let started_at = Utc::now();

        self.register().await?;

        self.enter(Phase::Starting);
        self.broadcast(&Message::Start).await?;

        let mut state = opening_state(self.first_turn);
        let first_turn = state.active();
        info!(match_id = %self.match_id, symbol = %first_turn, "First turn");
        self.broadcast(&Message::Board(*state.board())).await?;
        self.broadcast(&Message::Turn(first_turn)).await?;

        let mut moves = Vec::new();
        let result = loop {
            let mover = state.active();
            let position = self.next_valid_move(&state).await?;

            self.enter(Phase::Broadcasting);
            let evaluation = state.play(position)?;
            moves.push(position as u8);
            info!(
                match_id = %self.match_id,
                symbol = %mover,
                position,
                move_count = state.move_count(),
                board = %state.board().to_wire(),
                "Move accepted"
            );
            self.broadcast(&Message::Board(*state.board())).await?;

            self.enter(Phase::Evaluating);
            if evaluation.is_terminal() {
                break evaluation;
            }
            self.broadcast(&Message::Turn(state.active())).await?;
        };

        self.enter(Phase::GameOver);
        info!(match_id = %self.match_id, ?result, "Game over");
        self.broadcast(&Message::GameOver).await?;
        for peer in [&mut self.first, &mut self.second] {
            if let Some(symbol) = peer.symbol() {
                peer.send(&outcome_for(symbol, result)).await?;
            }
        }

        let x_peer = self.peer_mut(Symbol::X).id();
        let o_peer = self.peer_mut(Symbol::O).id();
        Ok(MatchReport {
            match_id: self.match_id,
            started_at,
            finished_at: Utc::now(),
            x_peer,
            o_peer,
            first_turn,
            moves,
            invalid_moves: self.invalid_moves,
            result,
        })
    }

    /// Registration reads from both peers run concurrently. The first peer
    /// picks a symbol; the second is assigned the complement.
    async fn register(&mut self) -> Result<()> {
        self.enter(Phase::RegisteringFirst);
        let limit = self.options.registration_timeout;

        let (chosen, ()) = tokio::try_join!(
            bounded(limit, "registration", register_first(&mut self.first)),
            bounded(limit, "registration", await_connect(&mut self.second)),
        )?;

        self.enter(Phase::RegisteringSecond);
        let leftover = chosen.complement();
        self.second.assign(leftover);
        self.second.send(&Message::Assign(leftover)).await?;

        if let (Some(first), Some(second)) = (self.first.symbol(), self.second.symbol()) {
            assert_symbols_complementary(first, second);
        }
        info!(
            match_id = %self.match_id,
            first = %chosen,
            second = %leftover,
            "Registration complete"
        );
        Ok(())
    }

    /// Read from the active peer until it names a legal cell, re-sending
    /// TURN to that peer after each rejected attempt.
    async fn next_valid_move(&mut self, state: &MatchState) -> Result<i32> {
        let active = state.active();
        let limit = self.options.move_timeout;
        let mut attempts = 0;

        loop {
            self.enter(Phase::AwaitingMove);
            let received = bounded(limit, "move", self.peer_mut(active).recv_move()).await;

            self.enter(Phase::ApplyingMove);
            match received {
                Ok(position) if state.is_valid_move(position) => return Ok(position),
                Ok(position) => {
                    debug!(match_id = %self.match_id, symbol = %active, position, "Invalid move")
                }
                Err(e) if e.is_transport() || matches!(e, Error::Timeout(_)) => return Err(e),
                Err(e) => {
                    debug!(
                        match_id = %self.match_id,
                        symbol = %active,
                        error = %e,
                        "Malformed move"
                    )
                }
            }

            attempts += 1;
            self.invalid_moves += 1;
            if attempts > self.options.max_invalid_moves {
                return Err(Error::TooManyInvalidMoves {
                    symbol: active,
                    attempts,
                });
            }
            self.peer_mut(active).send(&Message::Turn(active)).await?;
        }
    }

    async fn broadcast(&mut self, msg: &Message) -> Result<()> {
        self.first.send(msg).await?;
        self.second.send(msg).await
    }

    /// Peer holding `symbol`. Only meaningful after registration.
    fn peer_mut(&mut self, symbol: Symbol) -> &mut SessionPeer<S> {
        if self.first.symbol() == Some(symbol) {
            &mut self.first
        } else {
            &mut self.second
        }
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(match_id = %self.match_id, from = ?self.phase, to = ?phase, "Phase");
            self.phase = phase;
        }
    }
}

async fn register_first<S: AsyncRead + AsyncWrite + Unpin>(
    peer: &mut SessionPeer<S>,
) -> Result<Symbol> {
    if let Err(e) = peer.recv_connect().await {
        return Err(reject(peer, e).await);
    }
    peer.send(&Message::Choice).await?;

    let symbol = match peer.recv_choose().await {
        Ok(symbol) => symbol,
        Err(e) => return Err(reject(peer, e).await),
    };
    peer.assign(symbol);
    peer.send(&Message::Assign(symbol)).await?;
    Ok(symbol)
}

async fn await_connect<S: AsyncRead + AsyncWrite + Unpin>(peer: &mut SessionPeer<S>) -> Result<()> {
    if let Err(e) = peer.recv_connect().await {
        return Err(reject(peer, e).await);
    }
    Ok(())
}

/// Send REJECT for a malformed registration frame. Transport failures pass
/// through untouched since there is nobody left to tell.
async fn reject<S: AsyncRead + AsyncWrite + Unpin>(
    peer: &mut SessionPeer<S>,
    cause: Error,
) -> Error {
    if cause.is_transport() {
        return cause;
    }

    warn!(peer = %peer.id(), order = %peer.order(), error = %cause, "Rejecting registration");
    if let Err(e) = peer.send(&Message::Reject).await {
        debug!(peer = %peer.id(), error = %e, "REJECT not delivered");
    }
    peer.mark_unhealthy();
    Error::Rejected(format!("{} peer: {}", peer.order(), cause))
}

async fn bounded<T>(
    limit: Option<Duration>,
    phase: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(phase))?,
        None => fut.await,
    }
}

/// Resolves once shutdown is signalled. A closed channel means the server
/// handle is gone without asking for shutdown, so that never resolves.
async fn shutdown_requested(shutdown: Option<&mut broadcast::Receiver<()>>) {
    let Some(rx) = shutdown else {
        return std::future::pending().await;
    };
    match rx.recv().await {
        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => std::future::pending().await,
    }
}

fn opening_state(first_turn: Option<Symbol>) -> MatchState {
    match first_turn {
        Some(symbol) => MatchState::new(symbol),
        None => MatchState::coin_flip(&mut rand::thread_rng()),
    }
}

fn outcome_for(symbol: Symbol, result: Evaluation) -> Message {
    match result {
        Evaluation::Winner(winner) if winner == symbol => Message::Won,
        Evaluation::Winner(_) => Message::Lost,
        _ => Message::Tie,
    }
}
