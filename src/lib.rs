//! textplayer - drive a Z-machine interpreter as a subprocess
//!
//! Dumb-terminal interpreters such as `dfrotz` talk plain lines over
//! stdin/stdout, mixed with status lines and prompts. This crate hides that
//! protocol behind [`GameSession`]:
//!
//! ```no_run
//! use textplayer::{GameSession, SessionOptions};
//!
//! let session = GameSession::open("games/zork1.z5", SessionOptions::default())?;
//! println!("{}", session.run()?);
//! println!("{}", session.execute_command("open mailbox")?);
//! if let Some(score) = session.get_score()? {
//!     println!("score {}", score);
//! }
//! session.quit();
//! # Ok::<(), textplayer::ChannelError>(())
//! ```
//!
//! # Modules
//!
//! - **core**: process, output drain, aggregation, handshake, session facade
//! - **text**: output cleanup and score parsing
//! - **config**: `~/.textplayer/config.toml`
//! - **games**: game file lookup
//! - **transcript**: play logs

pub mod config;
pub mod core;
pub mod games;
pub mod text;
pub mod transcript;

pub use crate::config::Config;
pub use crate::core::{ChannelError, GameSession, LaunchError, SessionOptions, SessionState, Turn};
pub use crate::text::ScorePair;
