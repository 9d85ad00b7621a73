//! Error types for the interpreter channel.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::session::SessionState;

/// Failure to bring an interpreter process up.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Game file not found: {}", .0.display())]
    GameNotFound(PathBuf),

    #[error("Failed to spawn interpreter {}: {source}", .interpreter.display())]
    Spawn {
        interpreter: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Interpreter was spawned without a piped stdin/stdout")]
    MissingPipe,
}

/// Errors surfaced by [`GameSession`](super::session::GameSession) and the
/// components under it.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Failed to launch interpreter: {0}")]
    Launch(#[from] LaunchError),

    /// The interpreter closed its input, usually because it exited.
    #[error("Interpreter input is closed")]
    BrokenPipe,

    #[error("Session is not running")]
    NotRunning,

    #[error("Session is {found:?}, expected {expected:?}")]
    InvalidState {
        expected: SessionState,
        found: SessionState,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ChannelError {
    pub fn is_launch_error(&self) -> bool {
        matches!(self, ChannelError::Launch(_))
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
