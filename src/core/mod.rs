//! Interpreter process adapter.
//!
//! - **process**: interpreter lifecycle and stdin writes
//! - **drain**: background thread moving stdout lines into a channel
//! - **aggregator**: quiet-window polling that turns queued lines into a response
//! - **handshake**: startup banner handling
//! - **session**: `GameSession`, the run/execute/score/quit facade
//!
//! # Architecture
//!
//! ```text
//! GameSession
//! ├── ProcessSupervisor (interpreter process + stdin)
//! │   └── OutputDrain (reader thread) ──mpsc──┐
//! ├── OutputAggregator  <─────────────────────┘
//! └── StartupHandshake (runs once, inside run())
//! ```

pub mod aggregator;
pub mod drain;
pub mod error;
pub mod handshake;
pub mod process;
pub mod session;

pub use error::{ChannelError, LaunchError};
pub use handshake::{HandshakeRule, HandshakeStage, HandshakeState};
pub use process::ProcessTiming;
pub use session::{GameSession, SessionOptions, SessionState, Turn};
