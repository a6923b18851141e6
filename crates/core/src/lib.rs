//! Noughts Core Library
//!
//! Board engine, match state, configuration and invariants for the
//! Noughts two-player match server.

pub mod config;
pub mod error;
pub mod invariants;
pub mod models;

pub use config::{Framing, ServerConfig, DEFAULT_PORT};
pub use error::{Error, Result};
pub use models::*;
