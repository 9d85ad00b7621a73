//! Text processing for interpreter output.
//!
//! - **normalize**: status-line and whitespace cleanup
//! - **score**: score phrase extraction

pub mod normalize;
pub mod score;

pub use normalize::{clean, collapse, strip_status};
pub use score::{parse_score, ScorePair};
