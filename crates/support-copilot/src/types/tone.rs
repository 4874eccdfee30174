//! Customer tone labels and reply tone presets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Emotional tone detected in a customer message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Frustrated,
    Urgent,
    Calm,
    Confused,
    #[default]
    Neutral,
}

impl Tone {
    /// The closed label set, in prompt order
    pub const ALL: [Tone; 5] = [
        Tone::Frustrated,
        Tone::Urgent,
        Tone::Calm,
        Tone::Confused,
        Tone::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Frustrated => "frustrated",
            Tone::Urgent => "urgent",
            Tone::Calm => "calm",
            Tone::Confused => "confused",
            Tone::Neutral => "neutral",
        }
    }

    /// Parse a model answer into a label.
    ///
    /// Case, surrounding whitespace, quotes and trailing punctuation are
    /// ignored; anything else must match a label exactly.
    pub fn parse_label(raw: &str) -> Option<Tone> {
        let cleaned = raw
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '!' || c.is_whitespace())
            .to_lowercase();
        Tone::ALL.into_iter().find(|t| t.as_str() == cleaned)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tone presets offered to agents for the drafted reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseTone {
    #[default]
    Empathetic,
    Professional,
    Reassuring,
    Formal,
    Friendly,
}

impl ResponseTone {
    pub const ALL: [ResponseTone; 5] = [
        ResponseTone::Empathetic,
        ResponseTone::Professional,
        ResponseTone::Reassuring,
        ResponseTone::Formal,
        ResponseTone::Friendly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseTone::Empathetic => "empathetic",
            ResponseTone::Professional => "professional",
            ResponseTone::Reassuring => "reassuring",
            ResponseTone::Formal => "formal",
            ResponseTone::Friendly => "friendly",
        }
    }
}

impl fmt::Display for ResponseTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseTone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ResponseTone::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| Error::invalid(format!("unknown response tone '{}'", s)))
    }
}
