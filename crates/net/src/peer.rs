//! Session peer: one framed connection plus its registration state

use std::fmt;
use std::net::SocketAddr;

use noughts_core::{Framing, Symbol};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::FramedChannel;
use crate::protocol::{Message, CHOOSE_LEN, CONNECT_LEN, MOVE_LEN};

/// Order in which a peer arrived for its match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOrder {
    First,
    Second,
}

impl fmt::Display for RegistrationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationOrder::First => write!(f, "first"),
            RegistrationOrder::Second => write!(f, "second"),
        }
    }
}

/// A connected player
pub struct SessionPeer<S> {
    id: Uuid,
    addr: Option<SocketAddr>,
    order: RegistrationOrder,
    symbol: Option<Symbol>,
    channel: FramedChannel<S>,
    /// Cleared once the connection has failed or been rejected
    healthy: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin> SessionPeer<S> {
    pub fn new(
        stream: S,
        addr: Option<SocketAddr>,
        order: RegistrationOrder,
        framing: Framing,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            addr,
            order,
            symbol: None,
            channel: FramedChannel::new(stream, framing),
            healthy: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    pub fn order(&self) -> RegistrationOrder {
        self.order
    }

    pub fn symbol(&self) -> Option<Symbol> {
        self.symbol
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Symbols are fixed once assigned
    pub(crate) fn assign(&mut self, symbol: Symbol) {
        debug_assert!(
            self.symbol.is_none() || self.symbol == Some(symbol),
            "peer {} symbol reassigned",
            self.id
        );
        self.symbol = Some(symbol);
    }

    pub(crate) fn mark_unhealthy(&mut self) {
        self.healthy = false;
    }

    pub async fn send(&mut self, msg: &Message) -> Result<()> {
        trace!(peer = %self.id, ?msg, "Send");
        let result = self.channel.send_frame(&msg.encode()).await;
        self.note(result)
    }

    /// Expect a CONNECT frame
    pub async fn recv_connect(&mut self) -> Result<()> {
        match self.recv(CONNECT_LEN).await? {
            Message::Connect => Ok(()),
            other => Err(Error::Protocol(format!("Expected CONNECT, got {:?}", other))),
        }
    }

    /// Expect a CHOOSE frame naming X or O
    pub async fn recv_choose(&mut self) -> Result<Symbol> {
        match self.recv(CHOOSE_LEN).await? {
            Message::Choose(symbol) => Ok(symbol),
            other => Err(Error::Protocol(format!("Expected CHOOSE, got {:?}", other))),
        }
    }

    /// Expect a MOVE frame; returns the raw cell index
    pub async fn recv_move(&mut self) -> Result<i32> {
        match self.recv(MOVE_LEN).await? {
            Message::Move(index) => Ok(index),
            other => Err(Error::Protocol(format!("Expected MOVE, got {:?}", other))),
        }
    }

    async fn recv(&mut self, fixed_len: usize) -> Result<Message> {
        let bytes = self.channel.recv_frame(fixed_len).await;
        let bytes = self.note(bytes)?;
        let msg = Message::decode(&bytes);
        trace!(peer = %self.id, ?msg, "Recv");
        msg
    }

    /// Best-effort DISCONNECT and close; used on abandon and teardown
    pub async fn disconnect(&mut self) {
        if self.healthy {
            if let Err(e) = self.send(&Message::Disconnect).await {
                debug!(peer = %self.id, error = %e, "Disconnect notice failed");
            }
        }
        self.channel.close().await;
        self.healthy = false;
    }

    fn note<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_transport() {
                self.healthy = false;
            }
        }
        result
    }
}

impl<S> fmt::Debug for SessionPeer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPeer")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("order", &self.order)
            .field("symbol", &self.symbol)
            .field("healthy", &self.healthy)
            .finish()
    }
}
