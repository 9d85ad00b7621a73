//! Interpreter process wrapper
//!
//! Spawns the interpreter with piped stdin/stdout, wires its stdout into an
//! [`OutputDrain`], and shuts it down on request.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::aggregator::OutputAggregator;
use super::drain::OutputDrain;
use super::error::{ChannelError, LaunchError, Result};

/// Lines written on shutdown. Some games confirm with `y`, some ask a
/// second question that `n` answers.
const QUIT_SEQUENCE: [&str; 3] = ["quit", "y", "n"];

/// Poll interval while waiting for a graceful exit
const EXIT_POLL: Duration = Duration::from_millis(10);

/// Timing knobs for a supervised process
#[derive(Debug, Clone, Copy)]
pub struct ProcessTiming {
    pub quiet_window: Duration,
    pub first_output_timeout: Duration,
    /// How long `terminate` waits for the interpreter to exit on its own
    pub quit_grace: Duration,
}

impl Default for ProcessTiming {
    fn default() -> Self {
        Self {
            quiet_window: Duration::from_millis(10),
            first_output_timeout: Duration::from_millis(2000),
            quit_grace: Duration::from_millis(200),
        }
    }
}

/// A running interpreter process
pub struct ProcessSupervisor {
    child: Child,
    /// `None` once terminated
    stdin: Option<ChildStdin>,
    drain: OutputDrain,
    interpreter: PathBuf,
    quit_grace: Duration,
    terminated: bool,
}

impl ProcessSupervisor {
    /// Launch `interpreter game_path` and start draining its output.
    ///
    /// The game file is checked before anything is spawned.
    pub fn start(
        interpreter: &Path,
        game_path: &Path,
        timing: ProcessTiming,
    ) -> Result<(Self, OutputAggregator)> {
        if !game_path.exists() {
            return Err(LaunchError::GameNotFound(game_path.to_path_buf()).into());
        }

        let mut child = Command::new(interpreter)
            .arg(game_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                interpreter: interpreter.to_path_buf(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LaunchError::MissingPipe.into());
            }
        };

        let (tx, rx) = mpsc::channel::<String>();
        let drain = match OutputDrain::spawn(stdout, tx) {
            Ok(drain) => drain,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };

        info!(
            "Started interpreter {} (pid {}) for {}",
            interpreter.display(),
            child.id(),
            game_path.display()
        );

        let aggregator = OutputAggregator::new(rx, timing.quiet_window, timing.first_output_timeout);
        let supervisor = Self {
            child,
            stdin: Some(stdin),
            drain,
            interpreter: interpreter.to_path_buf(),
            quit_grace: timing.quit_grace,
            terminated: false,
        };

        Ok((supervisor, aggregator))
    }

    /// Write one line to the interpreter and flush it.
    pub fn send(&mut self, line: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(ChannelError::BrokenPipe)?;

        debug!("-> {:?}", line);
        write_line(stdin, line).map_err(|e| match e.kind() {
            io::ErrorKind::BrokenPipe => ChannelError::BrokenPipe,
            _ => ChannelError::Io(e),
        })
    }

    /// Shut the interpreter down.
    ///
    /// Sends the quit sequence, gives the process `quit_grace` to exit, then
    /// kills it. Safe to call repeatedly; failures are logged, never returned.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if let Some(mut stdin) = self.stdin.take() {
            for line in QUIT_SEQUENCE {
                if let Err(e) = write_line(&mut stdin, line) {
                    debug!("Quit sequence stopped at {:?}: {}", line, e);
                    break;
                }
            }
            // Dropping stdin closes the pipe
        }

        if !self.wait_for_exit(self.quit_grace) {
            info!("Interpreter {} did not exit, killing", self.child.id());
            if let Err(e) = self.child.kill() {
                warn!("Failed to kill interpreter: {}", e);
            }
            if let Err(e) = self.child.wait() {
                warn!("Failed to reap interpreter: {}", e);
            }
        }

        self.drain.reap();
        info!("Interpreter {} terminated", self.interpreter.display());
    }

    /// Whether the process is still alive
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// OS process id
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn drain(&self) -> &OutputDrain {
        &self.drain
    }

    fn wait_for_exit(&mut self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Interpreter exited: {}", status);
                    return true;
                }
                Ok(None) => {}
                Err(e) => {
                    // Treat as already gone
                    debug!("Failed to poll interpreter: {}", e);
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(EXIT_POLL);
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_game_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere.z5");

        // An interpreter that would fail loudly if it were ever spawned
        let result = ProcessSupervisor::start(
            Path::new("/nonexistent/interpreter"),
            &missing,
            ProcessTiming::default(),
        );

        match result {
            Err(ChannelError::Launch(LaunchError::GameNotFound(path))) => assert_eq!(path, missing),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("launch should fail"),
        }
    }

    #[test]
    fn test_unknown_interpreter_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let game = dir.path().join("game.z5");
        std::fs::write(&game, b"").unwrap();

        let err = ProcessSupervisor::start(
            Path::new("/nonexistent/interpreter"),
            &game,
            ProcessTiming::default(),
        )
        .err()
        .unwrap();

        assert!(err.is_launch_error());
        assert!(matches!(err, ChannelError::Launch(LaunchError::Spawn { .. })));
    }

    #[test]
    fn test_write_line_appends_newline() {
        let mut out = Vec::new();
        write_line(&mut out, "open mailbox").unwrap();
        write_line(&mut out, "").unwrap();
        assert_eq!(out, b"open mailbox\n\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_twice_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("echo.sh");
        std::fs::write(&script, "while IFS= read -r line; do echo \"$line\"; done\n").unwrap();

        let timing = ProcessTiming {
            quiet_window: Duration::from_millis(50),
            first_output_timeout: Duration::from_secs(2),
            quit_grace: Duration::from_millis(500),
        };
        let (mut supervisor, aggregator) =
            ProcessSupervisor::start(Path::new("/bin/sh"), &script, timing).unwrap();

        supervisor.send("look").unwrap();
        assert_eq!(aggregator.await_response(), "look\n");

        supervisor.terminate();
        supervisor.terminate();

        assert!(supervisor.is_terminated());
        assert!(!supervisor.is_alive());
        assert!(supervisor.drain().wait_finished(Duration::from_secs(2)));
        assert!(matches!(supervisor.send("look"), Err(ChannelError::BrokenPipe)));
    }

    #[cfg(unix)]
    #[test]
    fn test_stubborn_process_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("stubborn.sh");
        // Ignores stdin entirely and never exits on its own
        std::fs::write(&script, "exec sleep 30\n").unwrap();

        let timing = ProcessTiming {
            quit_grace: Duration::from_millis(50),
            ..ProcessTiming::default()
        };
        let (mut supervisor, _aggregator) =
            ProcessSupervisor::start(Path::new("/bin/sh"), &script, timing).unwrap();

        let started = Instant::now();
        supervisor.terminate();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!supervisor.is_alive());
        assert!(supervisor.drain().wait_finished(Duration::from_secs(2)));
    }
}
