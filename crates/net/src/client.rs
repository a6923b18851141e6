//! TCP client for playing a match
//!
//! Runs the client side of the protocol. Decisions (which symbol to ask for,
//! which cell to play) are delegated to a [`Player`].

use noughts_core::{Board, Framing, Symbol};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::frame::FramedChannel;
use crate::protocol::Message;

/// Outcome of a finished match, from this client's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Won,
    Lost,
    Tie,
}

/// Event received from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Final symbol for this match
    Assigned(Symbol),
    /// Match started
    Started,
    /// New board snapshot
    BoardUpdated(Board),
    /// Turn notice; `mine` when it names our symbol
    Turn { active: Symbol, mine: bool },
    /// Match ended, outcome follows
    GameOver,
}

/// Makes decisions on behalf of a client
pub trait Player {
    /// Symbol to ask for when offered a choice
    fn choose_symbol(&mut self) -> Result<Symbol>;

    /// Cell to play on `board` as `me`
    fn choose_move(&mut self, board: &Board, me: Symbol) -> Result<i32>;

    fn notify(&mut self, _event: &ClientEvent) {}
}

/// Client handle for one match
pub struct Client<S> {
    channel: FramedChannel<S>,
    symbol: Option<Symbol>,
    board: Board,
}

impl Client<TcpStream> {
    /// Connect to a match server
    pub async fn connect<A: ToSocketAddrs>(addr: A, framing: Framing) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        info!(addr = %peer, ?framing, "Connected to server");
        Ok(Self::new(stream, framing))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    pub fn new(stream: S, framing: Framing) -> Self {
        Self {
            channel: FramedChannel::new(stream, framing),
            symbol: None,
            board: Board::new(),
        }
    }

    /// Symbol assigned by the server, once registered
    pub fn symbol(&self) -> Option<Symbol> {
        self.symbol
    }

    /// Last board snapshot received
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Play one match to the end
    pub async fn play<P: Player>(&mut self, player: &mut P) -> Result<GameResult> {
        self.send(Message::Connect).await?;

        let symbol = match self.recv().await? {
            Message::Choice => {
                let wanted = player.choose_symbol()?;
                self.send(Message::Choose(wanted)).await?;
                match self.recv().await? {
                    Message::Assign(symbol) => symbol,
                    Message::Reject => return Err(rejected()),
                    other => return Err(unexpected("ASSIGN", other)),
                }
            }
            Message::Assign(symbol) => symbol,
            Message::Reject => return Err(rejected()),
            other => return Err(unexpected("CHOICE or ASSIGN", other)),
        };
        self.symbol = Some(symbol);
        info!(%symbol, "Registered");
        player.notify(&ClientEvent::Assigned(symbol));

        loop {
            match self.recv().await? {
                Message::Start => player.notify(&ClientEvent::Started),
                Message::Board(board) => {
                    self.board = board;
                    player.notify(&ClientEvent::BoardUpdated(board));
                }
                Message::Turn(active) => {
                    let mine = active == symbol;
                    player.notify(&ClientEvent::Turn { active, mine });
                    if mine {
                        let position = player.choose_move(&self.board, symbol)?;
                        self.send_move(position).await?;
                    }
                }
                Message::GameOver => {
                    player.notify(&ClientEvent::GameOver);
                    break;
                }
                Message::Disconnect => {
                    return Err(Error::Protocol("Server ended the match early".into()))
                }
                other => return Err(unexpected("game message", other)),
            }
        }

        let result = match self.recv().await? {
            Message::Won => GameResult::Won,
            Message::Lost => GameResult::Lost,
            Message::Tie => GameResult::Tie,
            other => return Err(unexpected("outcome", other)),
        };
        info!(?result, "Match finished");

        match self.recv().await? {
            Message::Disconnect => debug!("Server said goodbye"),
            other => warn!(?other, "Expected DISCONNECT"),
        }
        self.channel.close().await;

        Ok(result)
    }

    async fn send_move(&mut self, position: i32) -> Result<()> {
        // Fixed framing carries exactly one digit
        if self.channel.framing() == Framing::Fixed && !(0..=9).contains(&position) {
            return Err(Error::Protocol(format!(
                "Move {} does not fit a fixed-length frame",
                position
            )));
        }
        self.send(Message::Move(position)).await
    }

    async fn send(&mut self, msg: Message) -> Result<()> {
        self.channel.send_frame(&msg.encode()).await
    }

    async fn recv(&mut self) -> Result<Message> {
        let bytes = self.channel.recv_server_frame().await?;
        Message::decode(&bytes)
    }
}

fn rejected() -> Error {
    Error::Rejected("Server rejected registration".into())
}

fn unexpected(wanted: &str, got: Message) -> Error {
    Error::Protocol(format!("Expected {}, got {:?}", wanted, got))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    /// Plays the lowest free cell
    struct Scripted {
        symbol: Symbol,
        events: Vec<ClientEvent>,
    }

    impl Player for Scripted {
        fn choose_symbol(&mut self) -> Result<Symbol> {
            Ok(self.symbol)
        }

        fn choose_move(&mut self, board: &Board, _me: Symbol) -> Result<i32> {
            Ok((0..9).find(|&i| board.is_valid_move(i)).unwrap_or(0))
        }

        fn notify(&mut self, event: &ClientEvent) {
            self.events.push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_first_client_flow() {
        let (client_end, mut server_end) = duplex(256);
        let mut client = Client::new(client_end, Framing::Fixed);
        let mut player = Scripted {
            symbol: Symbol::O,
            events: Vec::new(),
        };

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 4];
            server_end.read_exact(&mut buf[..2]).await.unwrap();
            assert_eq!(&buf[..2], b"00");
            server_end.write_all(b"02").await.unwrap();
            server_end.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"01 O");
            server_end
                .write_all(b"0O0513 ---------11 O")
                .await
                .unwrap();
            server_end.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"10 0");
            server_end
                .write_all(b"13 O--------14202")
                .await
                .unwrap();
            server_end.write_all(b"2").await.unwrap();
        });

        let result = client.play(&mut player).await.unwrap();
        server.await.unwrap();

        assert_eq!(result, GameResult::Won);
        assert_eq!(client.symbol(), Some(Symbol::O));
        assert_eq!(client.board().to_wire(), "O--------");
        assert_eq!(player.events[0], ClientEvent::Assigned(Symbol::O));
        assert!(player.events.contains(&ClientEvent::Turn {
            active: Symbol::O,
            mine: true
        }));
        assert_eq!(player.events.last(), Some(&ClientEvent::GameOver));
    }

    #[tokio::test]
    async fn test_second_client_is_assigned() {
        let (client_end, mut server_end) = duplex(256);
        let mut client = Client::new(client_end, Framing::Fixed);
        let mut player = Scripted {
            symbol: Symbol::X,
            events: Vec::new(),
        };

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 2];
            server_end.read_exact(&mut buf).await.unwrap();
            // Assigned O without being offered a choice; the other side moves
            server_end
                .write_all(b"0O0513 ---------11 X13 X--------14")
                .await
                .unwrap();
            server_end.write_all(b"2122").await.unwrap();
        });

        let result = client.play(&mut player).await.unwrap();
        server.await.unwrap();

        assert_eq!(result, GameResult::Lost);
        assert_eq!(client.symbol(), Some(Symbol::O));
        assert!(player.events.contains(&ClientEvent::Turn {
            active: Symbol::X,
            mine: false
        }));
    }

    #[tokio::test]
    async fn test_reject_surfaces_as_error() {
        let (client_end, mut server_end) = duplex(256);
        let mut client = Client::new(client_end, Framing::Fixed);
        let mut player = Scripted {
            symbol: Symbol::X,
            events: Vec::new(),
        };

        server_end.write_all(b"061 REJECT").await.unwrap();
        let result = client.play(&mut player).await;
        assert!(matches!(result, Err(Error::Rejected(_))));
    }

    #[tokio::test]
    async fn test_early_disconnect_is_error() {
        let (client_end, mut server_end) = duplex(256);
        let mut client = Client::new(client_end, Framing::Fixed);
        let mut player = Scripted {
            symbol: Symbol::X,
            events: Vec::new(),
        };

        server_end.write_all(b"0O0522").await.unwrap();
        let result = client.play(&mut player).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }
}
