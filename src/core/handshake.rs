//! Startup banner handling
//!
//! Many games open with "press any key" and some then offer an
//! introduction. The handshake answers those prompts from a table of
//! trigger phrases so the caller receives the opening narrative in one
//! piece. It is a heuristic for known banner conventions and will not get
//! past every game's intro.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::Result;

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    NotStarted,
    AwaitingKeypress,
    AwaitingIntroDecline,
    Ready,
}

/// Which prompt a rule answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandshakeStage {
    Keypress,
    IntroDecline,
}

/// Trigger phrases and the line sent when one of them shows up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRule {
    pub stage: HandshakeStage,
    /// Matched case-insensitively against the accumulated text
    pub triggers: Vec<String>,
    pub response: String,
}

impl HandshakeRule {
    pub fn new(stage: HandshakeStage, triggers: &[&str], response: &str) -> Self {
        Self {
            stage,
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            response: response.to_string(),
        }
    }

    /// Whether any trigger occurs in `text`
    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.triggers
            .iter()
            .any(|trigger| !trigger.is_empty() && haystack.contains(&trigger.to_lowercase()))
    }
}

/// Built-in rules: a space for keypress banners, "no" to an introduction offer.
pub fn default_rules() -> Vec<HandshakeRule> {
    vec![
        HandshakeRule::new(
            HandshakeStage::Keypress,
            &[
                "press any key",
                "hit any key",
                "press a key",
                "hit a key",
                "press return",
                "press enter",
                "hit return",
                "hit enter",
            ],
            " ",
        ),
        HandshakeRule::new(HandshakeStage::IntroDecline, &["introduction"], "no"),
    ]
}

/// I/O the handshake needs from a session
pub trait HandshakeIo {
    /// First output after launch
    fn first_snapshot(&mut self) -> String;

    /// Send `line` and return the cleaned reply
    fn exchange(&mut self, line: &str) -> Result<String>;
}

/// One run of the startup sequence
pub struct StartupHandshake<'a> {
    rules: &'a [HandshakeRule],
    state: HandshakeState,
}

impl<'a> StartupHandshake<'a> {
    pub fn new(rules: &'a [HandshakeRule]) -> Self {
        Self {
            rules,
            state: HandshakeState::NotStarted,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Drive the handshake to `Ready` and return the opening narrative.
    pub fn run<I: HandshakeIo>(&mut self, io: &mut I) -> Result<String> {
        let mut narrative = io.first_snapshot();

        self.state = HandshakeState::AwaitingKeypress;
        self.answer(HandshakeStage::Keypress, io, &mut narrative)?;

        self.state = HandshakeState::AwaitingIntroDecline;
        self.answer(HandshakeStage::IntroDecline, io, &mut narrative)?;

        self.state = HandshakeState::Ready;
        info!("Startup handshake complete");
        Ok(narrative)
    }

    /// Fire the first rule of `stage` that matches, at most once.
    fn answer<I: HandshakeIo>(
        &self,
        stage: HandshakeStage,
        io: &mut I,
        narrative: &mut String,
    ) -> Result<()> {
        let rule = self
            .rules
            .iter()
            .filter(|rule| rule.stage == stage)
            .find(|rule| rule.matches(narrative));

        if let Some(rule) = rule {
            debug!("Handshake {:?}: sending {:?}", stage, rule.response);
            let reply = io.exchange(&rule.response)?;
            if reply.is_empty() {
                return Ok(());
            }
            if !narrative.is_empty() && !narrative.ends_with('\n') {
                narrative.push('\n');
            }
            narrative.push_str(&reply);
        }
        Ok(())
    }
}
