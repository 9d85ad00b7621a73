//! Colored line output using crossterm
//!
//! Game text is green, commands magenta, notices cyan, errors red.
//! Narrative is word-wrapped to the terminal width.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use unicode_width::UnicodeWidthStr;

/// Fallback when the terminal size is unknown (piped output)
const DEFAULT_WIDTH: usize = 80;

/// Line printer for the interactive player
pub struct Printer<W: Write> {
    out: W,
    width: usize,
}

impl Printer<io::Stdout> {
    pub fn stdout() -> Self {
        let width = terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(DEFAULT_WIDTH);
        Self::new(io::stdout(), width)
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width: width.max(20),
        }
    }

    /// Game output
    pub fn narrative(&mut self, text: &str) -> io::Result<()> {
        let wrapped = wrap(text, self.width);
        self.colored(Color::Green, &wrapped)
    }

    /// Echo of a command sent to the game
    pub fn command(&mut self, step: usize, command: &str) -> io::Result<()> {
        self.colored(Color::Magenta, &format!("{}> {}", step, command))
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        self.colored(Color::Cyan, text)
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.colored(Color::Red, text)
    }

    /// Input prompt, left on the current line
    pub fn prompt(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(Color::Yellow),
            Print("> "),
            ResetColor
        )?;
        self.out.flush()
    }

    fn colored(&mut self, color: Color, text: &str) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(color),
            Print(text),
            ResetColor,
            Print("\n")
        )?;
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

/// Word-wrap each line of `text` to `width` display columns.
///
/// Words wider than the line are left intact on a line of their own.
pub fn wrap(text: &str, width: usize) -> String {
    let mut wrapped = String::with_capacity(text.len());

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            wrapped.push('\n');
        }
        let mut used = 0;
        for word in line.split(' ').filter(|w| !w.is_empty()) {
            let w = UnicodeWidthStr::width(word);
            if used > 0 && used + 1 + w > width {
                wrapped.push('\n');
                used = 0;
            } else if used > 0 {
                wrapped.push(' ');
                used += 1;
            }
            wrapped.push_str(word);
            used += w;
        }
    }

    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_breaks_on_words() {
        let text = "You are standing in an open field west of a white house";
        assert_eq!(
            wrap(text, 20),
            "You are standing in\nan open field west\nof a white house"
        );
    }

    #[test]
    fn test_wrap_keeps_line_breaks_and_long_words() {
        assert_eq!(wrap("short\nline", 80), "short\nline");
        assert_eq!(wrap("a supercalifragilistic b", 10), "a\nsupercalifragilistic\nb");
    }

    #[test]
    fn test_wrap_counts_display_width() {
        // Each CJK character is two columns wide
        assert_eq!(wrap("宝箱 宝箱 宝箱", 10), "宝箱 宝箱\n宝箱");
    }

    #[test]
    fn test_narrative_is_colored_and_terminated() {
        let mut printer = Printer::new(Vec::new(), 80);
        printer.narrative("Taken.").unwrap();

        let out = String::from_utf8(printer.into_inner()).unwrap();
        assert!(out.contains("Taken."));
        assert!(out.starts_with("\x1b["));
        assert!(out.ends_with('\n'));
    }
}
