//! Play transcript for textplayer
//!
//! Appends what was typed and what the game answered to a plain text file,
//! normally the `<game>_log.txt` reported by
//! [`GameSession::log_path`](crate::core::session::GameSession::log_path).

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::session::Turn;

/// Append-only transcript file
pub struct Transcript {
    file: File,
    path: PathBuf,
}

impl Transcript {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the start of a play session and record the opening text
    pub fn record_opening(&mut self, narrative: &str) -> io::Result<()> {
        writeln!(self.file, "== session started at {}", unix_timestamp())?;
        self.write_block(narrative)
    }

    /// Record one command and its reply
    pub fn record_turn(&mut self, turn: &Turn) -> io::Result<()> {
        writeln!(self.file, "> {}", turn.command)?;
        self.write_block(&turn.response)
    }

    fn write_block(&mut self, text: &str) -> io::Result<()> {
        if !text.is_empty() {
            writeln!(self.file, "{}", text.trim_end())?;
        }
        self.file.flush()
    }
}

/// Read back the commands recorded in a transcript, oldest first
pub fn recorded_commands(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| line.strip_prefix("> "))
        .map(str::to_string)
        .collect())
}

fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(command: &str, response: &str) -> Turn {
        Turn {
            command: command.to_string(),
            response: response.to_string(),
        }
    }

    #[test]
    fn test_records_opening_and_turns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zork1.z5_log.txt");

        let mut transcript = Transcript::open(&path).unwrap();
        transcript.record_opening("West of House\nYou are standing in an open field.\n").unwrap();
        transcript.record_turn(&turn("open mailbox", "Opening the small mailbox reveals a leaflet.")).unwrap();
        transcript.record_turn(&turn("wait", "")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("== session started at "));
        assert!(content.contains("You are standing in an open field.\n> open mailbox\nOpening"));
        assert!(content.ends_with("> wait\n"));
        assert_eq!(transcript.path(), path.as_path());
    }

    #[test]
    fn test_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");

        Transcript::open(&path).unwrap().record_turn(&turn("north", "Forest")).unwrap();
        Transcript::open(&path).unwrap().record_turn(&turn("south", "Clearing")).unwrap();

        assert_eq!(recorded_commands(&path).unwrap(), vec!["north", "south"]);
    }
}
