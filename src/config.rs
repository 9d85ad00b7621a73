//! Configuration for textplayer.
//!
//! Settings are read from `~/.textplayer/config.toml`. Every field is
//! optional:
//!
//! ```toml
//! # Interpreter binary, launched as `<interpreter> <game file>`
//! interpreter = "./frotz/dfrotz"
//!
//! # Where game files live, and which one to start by default
//! games_dir = "games"
//! default_game = "zork1.z5"
//!
//! # Write `<game>_log.txt` transcripts next to the game
//! transcript = true
//!
//! [timing]
//! quiet_window_ms = 10
//! first_output_timeout_ms = 2000
//! quit_grace_ms = 200
//!
//! # Startup prompts to answer. Replaces the built-in table when present.
//! [[handshake]]
//! stage = "keypress"
//! triggers = ["press any key", "hit any key"]
//! response = " "
//!
//! [[handshake]]
//! stage = "intro-decline"
//! triggers = ["introduction"]
//! response = "no"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::handshake::{default_rules, HandshakeRule};
use crate::core::process::ProcessTiming;
use crate::core::session::{SessionOptions, DEFAULT_INTERPRETER};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter binary
    pub interpreter: PathBuf,
    /// Directory holding game files
    pub games_dir: PathBuf,
    /// Game started when none is named
    pub default_game: String,
    /// Keep a transcript next to each game
    pub transcript: bool,
    /// Output polling and shutdown timing
    pub timing: TimingConfig,
    /// Startup prompt table
    pub handshake: Vec<HandshakeRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            games_dir: PathBuf::from("games"),
            default_game: "zork1.z5".to_string(),
            transcript: true,
            timing: TimingConfig::default(),
            handshake: default_rules(),
        }
    }
}

/// Timing configuration, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub quiet_window_ms: u64,
    pub first_output_timeout_ms: u64,
    pub quit_grace_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            quiet_window_ms: 10,
            first_output_timeout_ms: 2000,
            quit_grace_ms: 200,
        }
    }
}

impl From<&TimingConfig> for ProcessTiming {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            quiet_window: Duration::from_millis(timing.quiet_window_ms),
            first_output_timeout: Duration::from_millis(timing.first_output_timeout_ms),
            quit_grace: Duration::from_millis(timing.quit_grace_ms),
        }
    }
}

impl Config {
    /// Load the user config, falling back to defaults if it is missing or
    /// unreadable
    pub fn load() -> Self {
        let Some(path) = Self::get_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Directory for config, log and other per-user files
    pub fn data_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".textplayer"))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("config.toml"))
    }

    /// Options for sessions started with this config
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            interpreter: self.interpreter.clone(),
            timing: ProcessTiming::from(&self.timing),
            handshake_rules: self.handshake.clone(),
            transcript: self.transcript,
        }
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
