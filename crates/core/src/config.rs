//! Server configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file at all) yields a working local server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default listening port
pub const DEFAULT_PORT: u16 = 9001;

/// Name of the config file inside the platform config dir
const CONFIG_FILE_NAME: &str = "config.toml";

/// How frames are delimited on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Fixed byte length per message kind, no explicit delimiting
    #[default]
    Fixed,
    /// 2-byte big-endian length followed by the payload
    Prefixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub framing: Framing,
    /// Seconds to wait on each registration read (0 disables)
    pub registration_timeout_secs: u64,
    /// Seconds to wait for the active peer's move (0 disables)
    pub move_timeout_secs: u64,
    /// Consecutive invalid moves tolerated in a single turn
    pub max_invalid_moves: u32,
    /// Run each match on its own task instead of one at a time
    pub concurrent_matches: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            framing: Framing::Fixed,
            registration_timeout_secs: 60,
            move_timeout_secs: 120,
            max_invalid_moves: 10,
            concurrent_matches: false,
        }
    }
}

impl ServerConfig {
    /// Load from `path` if given, else from the platform config dir if a
    /// file exists there, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config = Self::from_file(&path)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        if self.max_invalid_moves == 0 {
            return Err(Error::Config("max_invalid_moves must be at least 1".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn registration_timeout(&self) -> Option<Duration> {
        secs(self.registration_timeout_secs)
    }

    pub fn move_timeout(&self) -> Option<Duration> {
        secs(self.move_timeout_secs)
    }
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

/// `config.toml` in the platform-specific config directory
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "noughts").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
