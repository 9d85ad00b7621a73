//! Score extraction from a `score` command reply.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "<n> ... of ... <m>" in the phrasings Infocom-era games use, e.g.
    /// "10 (total points out of a possible 350)", "0 points out of 100",
    /// "3 of a possible 10", "7 of a maximum of 40".
    static ref SCORE_PHRASE: Regex = Regex::new(
        r"(?i)-?\d+\s+\(?\s*(?:total\s+)?(?:points?\s+)?(?:out\s+)?of\s+(?:a\s+maximum\s+of\s+)?(?:a\s+possible\s+)?\d+"
    )
    .unwrap();

    static ref NUMBER: Regex = Regex::new(r"-?\d+").unwrap();
}

/// Current and maximum score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorePair {
    pub current: i32,
    pub maximum: i32,
}

impl fmt::Display for ScorePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.maximum)
    }
}

/// Find a score phrase in `text`.
///
/// Returns `None` when the text has no recognizable score, which is normal
/// for games that do not keep one.
pub fn parse_score(text: &str) -> Option<ScorePair> {
    let phrase = SCORE_PHRASE.find(text)?.as_str();

    let mut numbers = NUMBER.find_iter(phrase).map(|m| m.as_str());
    let first = numbers.next()?;
    let last = numbers.last()?;

    Some(ScorePair {
        current: first.parse().ok()?,
        maximum: last.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(current: i32, maximum: i32) -> Option<ScorePair> {
        Some(ScorePair { current, maximum })
    }

    #[test]
    fn test_zork_phrasing() {
        let text = "Your score is 10 (total points out of a possible 350), in 12 moves.";
        assert_eq!(parse_score(text), pair(10, 350));
    }

    #[test]
    fn test_points_out_of() {
        assert_eq!(parse_score("You have 0 points out of 100."), pair(0, 100));
    }

    #[test]
    fn test_of_a_possible() {
        assert_eq!(parse_score("You have scored 3 of a possible 10."), pair(3, 10));
    }

    #[test]
    fn test_maximum_phrasing_is_case_insensitive() {
        assert_eq!(parse_score("SCORE: 7 OF A MAXIMUM OF 40"), pair(7, 40));
    }

    #[test]
    fn test_no_score() {
        assert_eq!(parse_score("This game does not keep score."), None);
        assert_eq!(parse_score(""), None);
    }

    #[test]
    fn test_overflow_is_unavailable() {
        assert_eq!(parse_score("99999999999 out of 10"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ScorePair { current: 25, maximum: 350 }.to_string(), "25/350");
    }
}
