//! Noughts Network Library
//!
//! Serves two-player noughts-and-crosses matches over TCP.
//!
//! # Architecture
//!
//! - **Server**: accepts connections and pairs them into matches
//! - **Coordinator**: drives one match from registration to teardown
//! - **Peer**: one framed connection plus its symbol
//! - **Client**: plays a match on behalf of a [`Player`]
//! - **Protocol**: short ASCII frames, fixed-length or length-prefixed
//!
//! # Usage
//!
//! ```ignore
//! // Host starts a server
//! let mut server = Server::start(ServerConfig::default()).await?;
//!
//! // Each player connects and plays
//! let mut client = Client::connect(server.addr(), Framing::Fixed).await?;
//! let result = client.play(&mut my_player).await?;
//!
//! // Finished matches are reported back to the host
//! while let Some(report) = server.next_report().await {
//!     println!("{:?}", report.result);
//! }
//! ```

pub mod client;
pub mod coordinator;
pub mod error;
mod frame;
pub mod peer;
pub mod protocol;
pub mod server;

pub use client::{Client, ClientEvent, GameResult, Player};
pub use coordinator::{Coordinator, MatchOptions};
pub use error::{Error, Result};
pub use frame::{FramedChannel, MAX_FRAME_SIZE};
pub use peer::{RegistrationOrder, SessionPeer};
pub use protocol::Message;
pub use server::Server;

pub use noughts_core::DEFAULT_PORT;
