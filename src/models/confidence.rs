//! Sample-size confidence for aggregated win rates.

use serde::{Deserialize, Serialize};

/// How much a win rate can be trusted given the games behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl Confidence {
    pub const HIGH_SAMPLE: u32 = 1000;
    pub const MEDIUM_SAMPLE: u32 = 100;

    pub fn from_sample_size(games: u32) -> Self {
        if games >= Self::HIGH_SAMPLE {
            Confidence::High
        } else if games >= Self::MEDIUM_SAMPLE {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Returns true if the sample is too small to show without a warning.
    pub fn needs_caveat(&self) -> bool {
        matches!(self, Confidence::Low)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}
