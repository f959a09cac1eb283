//! Win rates and tier bands.

use serde::{Deserialize, Serialize};

/// Build tier. Bands are applied to the Wilson score rather than the raw
/// win rate, so small samples cannot reach the top tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    const BANDS: [(f64, Tier); 4] = [(0.55, Tier::S), (0.52, Tier::A), (0.48, Tier::B), (0.45, Tier::C)];

    pub fn from_score(score: f64) -> Self {
        Self::BANDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::D)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `wins / games`, 0 for an empty sample. Wins are capped at games.
pub fn win_rate(wins: u32, games: u32) -> f64 {
    if games == 0 {
        return 0.0;
    }
    f64::from(wins.min(games)) / f64::from(games)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_bands() {
        assert_eq!(Tier::from_score(0.60), Tier::S);
        assert_eq!(Tier::from_score(0.55), Tier::S);
        assert_eq!(Tier::from_score(0.528), Tier::A);
        assert_eq!(Tier::from_score(0.50), Tier::B);
        assert_eq!(Tier::from_score(0.45), Tier::C);
        assert_eq!(Tier::from_score(0.438), Tier::D);
        assert_eq!(Tier::from_score(0.0), Tier::D);
    }

    #[test]
    fn test_tier_order_and_display() {
        assert!(Tier::S < Tier::D);
        assert_eq!(Tier::A.to_string(), "A");
    }

    #[test]
    fn test_win_rate() {
        assert!((win_rate(5, 6) - 0.8333).abs() < 1e-3);
        assert_eq!(win_rate(0, 0), 0.0);
        assert_eq!(win_rate(9, 6), 1.0);
    }
}
