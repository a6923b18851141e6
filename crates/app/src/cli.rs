//! Command-line interface for noughts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use noughts_core::{Framing, DEFAULT_PORT};

/// Noughts - two-player noughts and crosses over TCP
#[derive(Parser, Debug)]
#[command(name = "noughts")]
#[command(about = "Two-player noughts and crosses match server and client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the match server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        framing: FramingArgs,
    },

    /// Join a match as an interactive player
    Play {
        /// Address of the server
        host: String,

        /// Server port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[command(flatten)]
        framing: FramingArgs,
    },
}

#[derive(Args, Debug)]
pub struct FramingArgs {
    /// Use length-prefixed frames instead of fixed-length ones
    #[arg(long)]
    pub prefixed: bool,
}

impl FramingArgs {
    /// `None` when the flag is absent, so config files keep the final say
    pub fn framing(&self) -> Option<Framing> {
        self.prefixed.then_some(Framing::Prefixed)
    }
}
