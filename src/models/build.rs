//! Meta build records and their ranked form.

use serde::{Deserialize, Serialize};

use super::{win_rate, BuildId, Confidence, Tier};

fn default_mode() -> String {
    "ranked".to_string()
}

/// One sampled item set for a champion in a role and patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaBuild {
    pub champion: String,
    pub role: String,
    pub patch: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    pub items: Vec<u32>,
    pub wins: u32,
    pub games: u32,
}

impl MetaBuild {
    pub fn new(
        champion: impl Into<String>,
        role: impl Into<String>,
        patch: impl Into<String>,
        items: Vec<u32>,
        wins: u32,
        games: u32,
    ) -> Self {
        Self {
            champion: champion.into(),
            role: role.into(),
            patch: patch.into(),
            mode: default_mode(),
            items,
            wins,
            games,
        }
    }

    pub fn id(&self) -> BuildId {
        let items = self
            .items
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        BuildId::from_parts(&[
            &self.champion.to_lowercase(),
            &self.role.to_lowercase(),
            &self.patch,
            &self.mode.to_lowercase(),
            &items,
        ])
    }

    pub fn losses(&self) -> u32 {
        self.games.saturating_sub(self.wins)
    }

    pub fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.games)
    }

    /// Records with more wins than games are corrupt.
    pub fn is_consistent(&self) -> bool {
        self.wins <= self.games
    }
}

/// A build with its confidence-adjusted score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedBuild {
    pub id: BuildId,
    #[serde(flatten)]
    pub build: MetaBuild,
    pub losses: u32,
    pub win_rate: f64,
    /// Wilson lower bound of the win rate.
    pub score: f64,
    pub tier: Tier,
    pub confidence: Confidence,
}
