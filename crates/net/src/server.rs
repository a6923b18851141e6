//! TCP listener that pairs arriving connections into matches
//!
//! The first two connections to arrive form a match. By default matches are
//! served one at a time; with `concurrent_matches` each pair gets its own
//! task and isolated match state.

use std::net::SocketAddr;
use std::time::Duration;

use noughts_core::{Framing, MatchReport, ServerConfig};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::coordinator::{Coordinator, MatchOptions};
use crate::error::Result;
use crate::peer::{RegistrationOrder, SessionPeer};

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF_MS: u64 = 100;

/// Finished-match reports buffered for `next_report`
const REPORT_BUFFER: usize = 64;

/// Match server handle
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    report_rx: mpsc::Receiver<MatchReport>,
}

impl Server {
    /// Bind to `config.host:config.port` and start accepting players
    pub async fn start(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let bound_addr = listener.local_addr()?;

        info!(
            addr = %bound_addr,
            framing = ?config.framing,
            concurrent = config.concurrent_matches,
            "Server started"
        );

        let (shutdown_tx, _) = broadcast::channel(1);
        let (report_tx, report_rx) = mpsc::channel(REPORT_BUFFER);

        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(accept_loop(listener, config, report_tx, shutdown_rx));

        Ok(Server {
            addr: bound_addr,
            shutdown_tx,
            report_rx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the next finished match. Abandoned matches produce no report.
    pub async fn next_report(&mut self) -> Option<MatchReport> {
        self.report_rx.recv().await
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept pairs of connections and run a match for each
async fn accept_loop(
    listener: TcpListener,
    config: ServerConfig,
    report_tx: mpsc::Sender<MatchReport>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let options = MatchOptions::from_config(&config);

    loop {
        let pair = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
            pair = accept_pair(&listener, config.framing) => pair,
        };

        // Each match listens for shutdown itself so it can still say goodbye
        let (first, second) = pair;
        let coordinator = Coordinator::new(first, second, options.clone())
            .with_shutdown(shutdown_rx.resubscribe());

        if config.concurrent_matches {
            tokio::spawn(run_match(coordinator, report_tx.clone()));
        } else {
            run_match(coordinator, report_tx.clone()).await;
        }
    }
}

async fn accept_pair(
    listener: &TcpListener,
    framing: Framing,
) -> (SessionPeer<TcpStream>, SessionPeer<TcpStream>) {
    let first = accept_peer(listener, RegistrationOrder::First, framing).await;
    let second = accept_peer(listener, RegistrationOrder::Second, framing).await;
    (first, second)
}

async fn accept_peer(
    listener: &TcpListener,
    order: RegistrationOrder,
    framing: Framing,
) -> SessionPeer<TcpStream> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(addr = %addr, error = %e, "Could not set TCP_NODELAY");
                }
                let peer = SessionPeer::new(stream, Some(addr), order, framing);
                info!(addr = %addr, peer = %peer.id(), %order, "Accepted connection");
                return peer;
            }
            Err(e) => {
                error!(error = %e, "Accept failed");
                tokio::time::sleep(Duration::from_millis(ACCEPT_BACKOFF_MS)).await;
            }
        }
    }
}

/// Run one match; failures are logged and never stop the listener
async fn run_match<S>(coordinator: Coordinator<S>, report_tx: mpsc::Sender<MatchReport>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let match_id = coordinator.match_id();

    match coordinator.run().await {
        Ok(report) => {
            match report.to_json_line() {
                Ok(line) => info!(match_id = %match_id, report = %line, "Match finished"),
                Err(e) => warn!(match_id = %match_id, error = %e, "Report serialization failed"),
            }
            if report_tx.try_send(report).is_err() {
                debug!(match_id = %match_id, "Report dropped, nobody listening");
            }
        }
        Err(e) => {
            warn!(match_id = %match_id, error = %e, "Match abandoned");
        }
    }
}
