//! Noughts - two-player match server and console client

use clap::Parser;
use noughts_core::ServerConfig;
use noughts_net::{Client, GameResult, Server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod console;

use cli::{Cli, Command};
use console::ConsolePlayer;

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run(cli.command));

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> noughts_net::Result<()> {
    match command {
        Command::Serve {
            config,
            host,
            port,
            framing,
        } => {
            let mut config = ServerConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(framing) = framing.framing() {
                config.framing = framing;
            }
            serve(config).await
        }
        Command::Play {
            host,
            port,
            framing,
        } => play(&host, port, framing.framing().unwrap_or_default()).await,
    }
}

/// Serve matches until Ctrl-C
async fn serve(config: ServerConfig) -> noughts_net::Result<()> {
    let mut server = Server::start(config).await?;
    println!("Server is now awaiting connections on {}", server.addr());

    loop {
        tokio::select! {
            report = server.next_report() => match report {
                Some(report) => info!(
                    match_id = %report.match_id,
                    result = ?report.result,
                    moves = report.moves.len(),
                    "Match complete"
                ),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                server.shutdown();
                break;
            }
        }
    }

    println!("Server stopped");
    Ok(())
}

/// Join a server and play one match from the terminal
async fn play(host: &str, port: u16, framing: noughts_core::Framing) -> noughts_net::Result<()> {
    let mut client = Client::connect((host, port), framing).await?;
    let mut player = ConsolePlayer::stdin();

    let result = client.play(&mut player).await?;
    match result {
        GameResult::Won => println!("You Won!"),
        GameResult::Lost => println!("You Lost :("),
        GameResult::Tie => println!("Tie!"),
    }
    println!("You have been disconnected from the server");
    Ok(())
}
