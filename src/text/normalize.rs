//! Interpreter output cleanup
//!
//! Dumb interpreters print a status line (room name, score, moves or a
//! clock) before each response and a `>` prompt after it. [`clean`] removes
//! that noise and tidies whitespace so callers get plain narrative.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Status-line fragments, applied in order. Only the first hit of each
    /// pattern is acted on.
    static ref NOISE_PATTERNS: Vec<Regex> = [
        // "12/34" score/moves counter
        r"\d+/\d+",
        r"(?i)score:\s*-*\d+",
        r"(?i)moves:\s*\d+",
        r"(?i)turns:\s*\d+",
        // 12-hour clock on time-based games
        r"(?i)\d+:\d+\s*[ap]m",
        // Numbered prompt fragment
        r" \d+ \.",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect();

    static ref SPACE_RUN: Regex = Regex::new(r" {2,}").unwrap();
    /// A line break followed by any number of blank or whitespace-only lines
    static ref BLANK_RUN: Regex = Regex::new(r"\n(?:[ \t]*\n)+").unwrap();
}

/// Full cleanup: [`collapse`], then [`strip_status`], then trim.
pub fn clean(text: &str) -> String {
    let collapsed = collapse(text);
    strip_status(&collapsed).trim().to_string()
}

/// Replace prompt markers with spaces and squeeze whitespace.
///
/// Runs of spaces become one space and runs of blank lines become a single
/// line break. Ordinary line breaks are kept.
pub fn collapse(text: &str) -> String {
    let unprompted = text.replace(['>', '<'], " ");
    let spaced = SPACE_RUN.replace_all(&unprompted, " ");
    BLANK_RUN.replace_all(&spaced, "\n").into_owned()
}

/// Drop everything up to and including the first match of each noise
/// pattern.
///
/// Later occurrences of the same pattern are left alone.
pub fn strip_status(text: &str) -> &str {
    let mut rest = text;
    for pattern in NOISE_PATTERNS.iter() {
        if let Some(m) = pattern.find(rest) {
            rest = &rest[m.end()..];
        }
    }
    rest
}

/// Whether any noise pattern still occurs in `text`
pub fn has_noise(text: &str) -> bool {
    NOISE_PATTERNS.iter().any(|pattern| pattern.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_status_line() {
        let raw = " West of House                          Score: 0        Moves: 1\n\n\
                   You are standing in an open field west of a white house.\n\n>";
        assert_eq!(
            clean(raw),
            "You are standing in an open field west of a white house."
        );
    }

    #[test]
    fn test_strips_slash_counter() {
        let raw = " Living Room                                   25/14\nThe trophy case is empty.\n>";
        assert_eq!(clean(raw), "The trophy case is empty.");
    }

    #[test]
    fn test_strips_clock() {
        let raw = " Outside the Real Estate Office            9:05 am\nA sign reads FOR SALE.\n>";
        assert_eq!(clean(raw), "A sign reads FOR SALE.");
    }

    #[test]
    fn test_only_first_occurrence_is_stripped() {
        let raw = "Score: 5 Moves: 3\nYou read: \"Score: 10\" is carved here.";
        let cleaned = clean(raw);
        assert!(cleaned.contains("Score: 10"));
        assert!(!cleaned.contains("Moves"));
    }

    #[test]
    fn test_collapse_prompts_and_whitespace() {
        assert_eq!(collapse(">look\n\n\nKitchen   table"), " look\nKitchen table");
        assert_eq!(collapse("a\n  \nb"), "a\nb");
        assert_eq!(collapse("<quote>"), " quote ");
    }

    #[test]
    fn test_collapse_keeps_single_breaks() {
        assert_eq!(collapse("line one\nline two\n"), "line one\nline two\n");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let samples = [
            " West of House   Score: 0   Moves: 0\n\nYou are standing in an open field.\n\n\n>",
            "Taken.\n>",
            "   \n\n  It is pitch black.  You are likely to be eaten by a grue.\n\n>  ",
            "<Hit any key>\n\nZORK I: The Great Underground Empire",
            "",
        ];
        for raw in samples {
            let once = clean(raw);
            if has_noise(&once) {
                continue;
            }
            assert_eq!(clean(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_plain_narrative_untouched() {
        let text = "There is a small mailbox here.";
        assert_eq!(clean(text), text);
        assert!(!has_noise(text));
    }
}
