//! Full matches between real TCP clients and a running server

use std::time::Duration;

use noughts_core::{Board, Evaluation, Framing, ServerConfig, Symbol};
use noughts_net::{Client, Error, GameResult, Player, Result, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Asks for X and always plays the lowest free cell
struct LowestFree;

impl Player for LowestFree {
    fn choose_symbol(&mut self) -> Result<Symbol> {
        Ok(Symbol::X)
    }

    fn choose_move(&mut self, board: &Board, _me: Symbol) -> Result<i32> {
        Ok((0..9).find(|&i| board.is_valid_move(i)).unwrap_or(0))
    }
}

fn config(framing: Framing) -> ServerConfig {
    ServerConfig {
        port: 0,
        framing,
        move_timeout_secs: 5,
        registration_timeout_secs: 5,
        ..ServerConfig::default()
    }
}

async fn play_one(addr: std::net::SocketAddr, framing: Framing) -> (Symbol, GameResult) {
    let mut client = Client::connect(addr, framing).await.unwrap();
    let result = client.play(&mut LowestFree).await.unwrap();
    (client.symbol().unwrap(), result)
}

/// Both players filling the lowest free cell means whoever moves first
/// completes the 2-4-6 diagonal on the seventh move.
async fn assert_first_mover_wins(framing: Framing) {
    let mut server = Server::start(config(framing)).await.unwrap();
    let addr = server.addr();

    let (a, b) = tokio::join!(play_one(addr, framing), play_one(addr, framing));
    let report = tokio::time::timeout(Duration::from_secs(5), server.next_report())
        .await
        .unwrap()
        .unwrap();

    assert_ne!(a.0, b.0);
    assert_eq!(report.result, Evaluation::Winner(report.first_turn));
    assert_eq!(report.moves, vec![0, 1, 2, 3, 4, 5, 6]);
    for (symbol, result) in [a, b] {
        let expected = if symbol == report.first_turn {
            GameResult::Won
        } else {
            GameResult::Lost
        };
        assert_eq!(result, expected);
    }

    server.shutdown();
}

#[tokio::test]
async fn test_full_match_fixed_framing() {
    assert_first_mover_wins(Framing::Fixed).await;
}

#[tokio::test]
async fn test_full_match_prefixed_framing() {
    assert_first_mover_wins(Framing::Prefixed).await;
}

#[tokio::test]
async fn test_server_survives_rejected_registration() {
    let mut server = Server::start(config(Framing::Fixed)).await.unwrap();
    let addr = server.addr();

    let mut bad = TcpStream::connect(addr).await.unwrap();
    bad.write_all(b"99").await.unwrap();
    let mut idle = TcpStream::connect(addr).await.unwrap();

    let mut bad_rx = Vec::new();
    bad.read_to_end(&mut bad_rx).await.unwrap();
    let mut idle_rx = Vec::new();
    idle.read_to_end(&mut idle_rx).await.unwrap();
    assert_eq!(bad_rx, b"061 REJECT");
    assert_eq!(idle_rx, b"22");

    // The next pair gets a normal match
    let (a, b) = tokio::join!(
        play_one(addr, Framing::Fixed),
        play_one(addr, Framing::Fixed)
    );
    assert_ne!(a.0, b.0);

    let report = tokio::time::timeout(Duration::from_secs(5), server.next_report())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.moves.len(), 7);

    server.shutdown();
}

#[tokio::test]
async fn test_concurrent_matches_are_isolated() {
    let mut server = Server::start(ServerConfig {
        concurrent_matches: true,
        ..config(Framing::Fixed)
    })
    .await
    .unwrap();
    let addr = server.addr();

    // Park the first match in registration while a second one completes
    let mut parked_a = TcpStream::connect(addr).await.unwrap();
    let mut parked_b = TcpStream::connect(addr).await.unwrap();
    parked_a.write_all(b"00").await.unwrap();
    parked_b.write_all(b"00").await.unwrap();

    let (a, b) = tokio::join!(
        play_one(addr, Framing::Fixed),
        play_one(addr, Framing::Fixed)
    );
    assert_ne!(a.0, b.0);

    let report = tokio::time::timeout(Duration::from_secs(5), server.next_report())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.moves.len(), 7);

    drop(parked_a);
    drop(parked_b);
    server.shutdown();
}

#[tokio::test]
async fn test_fixed_client_refuses_oversized_move() {
    struct Wild;

    impl Player for Wild {
        fn choose_symbol(&mut self) -> Result<Symbol> {
            Ok(Symbol::O)
        }

        fn choose_move(&mut self, _board: &Board, _me: Symbol) -> Result<i32> {
            Ok(-1)
        }
    }

    let mut server = Server::start(config(Framing::Fixed)).await.unwrap();
    let addr = server.addr();

    let wild = async {
        let mut client = Client::connect(addr, Framing::Fixed).await.unwrap();
        client.play(&mut Wild).await
    };
    let tame = async {
        let mut client = Client::connect(addr, Framing::Fixed).await.unwrap();
        client.play(&mut LowestFree).await
    };
    let (wild, tame) = tokio::join!(wild, tame);

    // The first mover may be either side; whoever plays the wild move errors
    // out and the match is abandoned for both.
    assert!(matches!(wild, Err(Error::Protocol(_)) | Err(Error::ShortRead { .. })));
    assert!(tame.is_err());

    // Abandoned matches never produce a report
    server.shutdown();
    let next = tokio::time::timeout(Duration::from_millis(200), server.next_report()).await;
    assert!(!matches!(next, Ok(Some(_))));
}
