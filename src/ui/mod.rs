//! Terminal output for the interactive player.
//!
//! - **printer**: colored, word-wrapped line output

pub mod printer;

pub use printer::Printer;
