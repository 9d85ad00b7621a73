//! Game session management
//!
//! [`GameSession`] is the public face of the crate. It owns one interpreter
//! process and turns it into a blocking command/response channel:
//!
//! ```text
//! Unloaded --load--> Loaded --run--> Running --quit--> Terminated
//!                                     |   ^
//!                                     +---+ execute_command / get_score
//! ```
//!
//! All methods take `&self`, so a session can be shared across threads and
//! `quit` may be called while another thread is waiting on a response.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::aggregator::OutputAggregator;
use super::error::{ChannelError, LaunchError, Result};
use super::handshake::{default_rules, HandshakeIo, HandshakeRule, StartupHandshake};
use super::process::{ProcessSupervisor, ProcessTiming};
use crate::text::{clean, collapse, parse_score, ScorePair};

/// Interpreter used when nothing else is configured
pub const DEFAULT_INTERPRETER: &str = "./frotz/dfrotz";

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
    Running,
    Terminated,
}

/// How a session launches and talks to its interpreter
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub interpreter: PathBuf,
    pub timing: ProcessTiming,
    pub handshake_rules: Vec<HandshakeRule>,
    /// Whether the session advertises a transcript path
    pub transcript: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            timing: ProcessTiming::default(),
            handshake_rules: default_rules(),
            transcript: true,
        }
    }
}

/// One command and the cleaned reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub command: String,
    pub response: String,
}

/// State guarded together: lifecycle plus the process handle
struct Control {
    state: SessionState,
    game_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    process: Option<ProcessSupervisor>,
}

/// A text adventure running in an external interpreter
pub struct GameSession {
    options: SessionOptions,
    control: Mutex<Control>,
    /// Locked separately so `quit` never waits on an in-flight read
    output: Mutex<Option<OutputAggregator>>,
}

impl GameSession {
    /// Create an unloaded session
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            control: Mutex::new(Control {
                state: SessionState::Unloaded,
                game_path: None,
                log_path: None,
                process: None,
            }),
            output: Mutex::new(None),
        }
    }

    /// Create a session and load `game_path` into it
    pub fn open(game_path: impl AsRef<Path>, options: SessionOptions) -> Result<Self> {
        let session = Self::new(options);
        session.load(game_path)?;
        Ok(session)
    }

    /// Verify the game file and move to `Loaded`
    pub fn load(&self, game_path: impl AsRef<Path>) -> Result<()> {
        let game_path = game_path.as_ref();
        let mut control = lock(&self.control);
        expect_state(control.state, SessionState::Unloaded)?;

        if !game_path.exists() {
            return Err(LaunchError::GameNotFound(game_path.to_path_buf()).into());
        }

        control.game_path = Some(game_path.to_path_buf());
        control.log_path = self.options.transcript.then(|| transcript_path(game_path));
        control.state = SessionState::Loaded;
        info!("Loaded game {}", game_path.display());
        Ok(())
    }

    /// Start the interpreter, get past the banner and return the opening text
    pub fn run(&self) -> Result<String> {
        {
            let mut control = lock(&self.control);
            expect_state(control.state, SessionState::Loaded)?;
            let game_path = control
                .game_path
                .clone()
                .ok_or(ChannelError::InvalidState {
                    expected: SessionState::Loaded,
                    found: control.state,
                })?;

            let (process, aggregator) = ProcessSupervisor::start(
                &self.options.interpreter,
                &game_path,
                self.options.timing,
            )?;

            *lock(&self.output) = Some(aggregator);
            control.process = Some(process);
            control.state = SessionState::Running;
        }

        let mut io = SessionIo { session: self };
        let result = StartupHandshake::new(&self.options.handshake_rules).run(&mut io);
        if let Err(e) = &result {
            warn!("Startup handshake failed: {}", e);
            self.quit();
        }
        result
    }

    /// Send `text` verbatim and return the cleaned reply.
    ///
    /// If the interpreter has exited, the session becomes `Terminated` and
    /// whatever output was still queued is returned.
    pub fn execute_command(&self, text: &str) -> Result<String> {
        match self.send(text) {
            Ok(()) => Ok(clean(&self.await_output())),
            Err(ChannelError::BrokenPipe) => Ok(clean(&self.pending_output())),
            Err(e) => Err(e),
        }
    }

    /// Ask the game for its score.
    ///
    /// `Ok(None)` means the reply had no recognizable score.
    pub fn get_score(&self) -> Result<Option<ScorePair>> {
        match self.send("score") {
            Ok(()) => {}
            Err(ChannelError::BrokenPipe) => return Ok(None),
            Err(e) => return Err(e),
        }
        let reply = collapse(&self.await_output());
        let score = parse_score(&reply);
        debug!("Score reply parsed as {:?}", score);
        Ok(score)
    }

    /// Run every command in a script file, one per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. Stops early if
    /// the game ends.
    pub fn execute_command_file(&self, path: impl AsRef<Path>) -> Result<Vec<Turn>> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut turns = Vec::new();

        for line in content.lines() {
            let command = line.trim_end_matches('\r');
            if command.trim().is_empty() || command.trim_start().starts_with('#') {
                continue;
            }
            if self.state() != SessionState::Running {
                break;
            }
            let response = self.execute_command(command)?;
            turns.push(Turn {
                command: command.to_string(),
                response,
            });
        }

        Ok(turns)
    }

    /// Shut the interpreter down. Idempotent and infallible.
    pub fn quit(&self) {
        let mut control = lock(&self.control);
        if let Some(process) = control.process.as_mut() {
            process.terminate();
        }
        if control.state != SessionState::Terminated {
            info!("Session terminated");
        }
        control.state = SessionState::Terminated;
    }

    pub fn state(&self) -> SessionState {
        lock(&self.control).state
    }

    /// `Running` and the interpreter process still alive
    pub fn is_running(&self) -> bool {
        let mut control = lock(&self.control);
        control.state == SessionState::Running
            && control.process.as_mut().map_or(false, |p| p.is_alive())
    }

    pub fn game_path(&self) -> Option<PathBuf> {
        lock(&self.control).game_path.clone()
    }

    /// Where a transcript for this game belongs, if transcripts are enabled
    pub fn log_path(&self) -> Option<PathBuf> {
        lock(&self.control).log_path.clone()
    }

    /// Interpreter process id while one exists
    pub fn pid(&self) -> Option<u32> {
        lock(&self.control).process.as_ref().map(|p| p.id())
    }

    /// Wait up to `timeout` for the output reader to exit.
    ///
    /// Returns `true` if no reader is running.
    pub fn reader_finished(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let running = lock(&self.control)
                .process
                .as_ref()
                .map_or(false, |p| p.drain().is_running());
            if !running {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn send(&self, line: &str) -> Result<()> {
        let mut control = lock(&self.control);
        if control.state != SessionState::Running {
            return Err(ChannelError::NotRunning);
        }
        let process = control.process.as_mut().ok_or(ChannelError::NotRunning)?;

        match process.send(line) {
            Err(ChannelError::BrokenPipe) => {
                warn!("Interpreter is gone, ending session");
                process.terminate();
                control.state = SessionState::Terminated;
                Err(ChannelError::BrokenPipe)
            }
            other => other,
        }
    }

    fn await_output(&self) -> String {
        lock(&self.output)
            .as_ref()
            .map(OutputAggregator::await_response)
            .unwrap_or_default()
    }

    fn pending_output(&self) -> String {
        lock(&self.output)
            .as_ref()
            .map(OutputAggregator::snapshot)
            .unwrap_or_default()
    }
}

/// Handshake I/O on top of a running session
struct SessionIo<'a> {
    session: &'a GameSession,
}

impl HandshakeIo for SessionIo<'_> {
    fn first_snapshot(&mut self) -> String {
        collapse(&self.session.await_output())
    }

    fn exchange(&mut self, line: &str) -> Result<String> {
        self.session.execute_command(line)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn expect_state(found: SessionState, expected: SessionState) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(ChannelError::InvalidState { expected, found })
    }
}

/// `games/zork1.z5` -> `games/zork1.z5_log.txt`
fn transcript_path(game_path: &Path) -> PathBuf {
    let name = game_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "game".to_string());
    game_path.with_file_name(format!("{}_log.txt", name))
}
