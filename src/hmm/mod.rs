pub mod context;
pub mod frequency;
pub mod model;
pub mod tagger;
pub mod trainer;

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::corpus::{Token, POS};

/// Sentinel tag preceding the first word of every sentence.
pub const START_TAG: &str = "*START*";
/// Reserved placeholder tag. Never counted nor assigned.
pub const PREVIOUS_TAG: &str = "*Previous*";

/// Log-probability standing in for "no evidence".
pub const EPSILON: f64 = -10_000_000.0;

/// Emission estimation strategy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Smoothing {
    /// Relative frequencies; known words unseen with a tag score `EPSILON`.
    #[default]
    Plain,
    /// Good-Turing re-estimated counts with a shared score for unseen pairs.
    GoodTuring,
}

impl Display for Smoothing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Smoothing::Plain => write!(f, "plain"),
            Smoothing::GoodTuring => write!(f, "good-turing"),
        }
    }
}

impl FromStr for Smoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Smoothing::Plain),
            "good-turing" | "gt" => Ok(Smoothing::GoodTuring),
            _ => Err(format!("unknown smoothing: {s}")),
        }
    }
}

/// Read access to a token during training and decoding.
pub trait Observation {
    fn surface(&self) -> &str;
    fn pos(&self) -> Option<&str>;

    /// Case-folded form used for every lookup.
    fn word(&self) -> String {
        self.surface().to_lowercase()
    }
}

/// Write access used by the decoder to attach the chosen tag.
pub trait Annotate: Observation {
    fn set_pos(&mut self, pos: &str);
}

impl Observation for Token {
    fn surface(&self) -> &str {
        &self.name
    }

    fn pos(&self) -> Option<&str> {
        self.attr(POS)
    }
}

impl Annotate for Token {
    fn set_pos(&mut self, pos: &str) {
        self.set_attr(POS, pos);
    }
}

impl Observation for (&str, &str) {
    fn surface(&self) -> &str {
        self.0
    }

    fn pos(&self) -> Option<&str> {
        Some(self.1)
    }
}

impl Observation for (String, String) {
    fn surface(&self) -> &str {
        &self.0
    }

    fn pos(&self) -> Option<&str> {
        Some(&self.1)
    }
}

impl Observation for &str {
    fn surface(&self) -> &str {
        self
    }

    fn pos(&self) -> Option<&str> {
        None
    }
}
