//! Confidence-adjusted ranking of meta builds.
//!
//! A build's raw win rate is replaced by the lower bound of its Wilson score
//! interval, so a small sample has to win a lot more to outrank a large one.

use std::cmp::Ordering;

use serde::Deserialize;
use tracing::warn;

use crate::models::{Confidence, MetaBuild, RankedBuild, Tier};

/// z for a two-sided 95% interval.
pub const DEFAULT_Z: f64 = 1.96;

/// Lower bound of the Wilson score interval for proportion `p` over `n`
/// trials.
pub fn wilson_lower_bound(p: f64, n: u32, z: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    let n = n as f64;
    let z2 = z * z;

    let centre = p + z2 / (2.0 * n);
    let margin = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    let bound = (centre - margin) / (1.0 + z2 / n);
    // cancellation can leave a hair below zero or above p
    bound.clamp(0.0, p)
}

pub fn wilson_from_counts(wins: u32, games: u32, z: f64) -> f64 {
    if games == 0 {
        return 0.0;
    }
    wilson_lower_bound(wins.min(games) as f64 / games as f64, games, z)
}

#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    pub z: f64,
    pub min_games: u32,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            z: DEFAULT_Z,
            min_games: 0,
        }
    }
}

/// Case-insensitive filter; `None` matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildFilter {
    pub champion: Option<String>,
    pub role: Option<String>,
    pub patch: Option<String>,
    pub mode: Option<String>,
}

impl BuildFilter {
    pub fn matches(&self, build: &MetaBuild) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &str) -> bool {
            match wanted.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(w) => w.eq_ignore_ascii_case(actual.trim()),
            }
        }

        field_matches(&self.champion, &build.champion)
            && field_matches(&self.role, &build.role)
            && field_matches(&self.patch, &build.patch)
            && field_matches(&self.mode, &build.mode)
    }
}

pub fn filter_builds<'a>(builds: &'a [MetaBuild], filter: &BuildFilter) -> Vec<&'a MetaBuild> {
    builds.iter().filter(|b| filter.matches(b)).collect()
}

pub fn rank_build(build: &MetaBuild, z: f64) -> RankedBuild {
    let score = wilson_from_counts(build.wins, build.games, z);
    RankedBuild {
        id: build.id(),
        losses: build.losses(),
        win_rate: build.win_rate(),
        score,
        tier: Tier::from_score(score),
        confidence: Confidence::from_sample_size(build.games),
        build: build.clone(),
    }
}

/// Rank builds by Wilson score, then sample size, then id.
///
/// Builds with more wins than games are dropped.
pub fn rank_builds<'a, I>(builds: I, options: &RankingOptions) -> Vec<RankedBuild>
where
    I: IntoIterator<Item = &'a MetaBuild>,
{
    let mut ranked: Vec<RankedBuild> = builds
        .into_iter()
        .filter(|b| {
            if !b.is_consistent() {
                warn!(
                    "Dropping build {} for {}: {} wins over {} games",
                    b.id(),
                    b.champion,
                    b.wins,
                    b.games
                );
                return false;
            }
            b.games >= options.min_games
        })
        .map(|b| rank_build(b, options.z))
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.build.games.cmp(&a.build.games))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
}

pub fn best_build<'a, I>(builds: I, options: &RankingOptions) -> Option<RankedBuild>
where
    I: IntoIterator<Item = &'a MetaBuild>,
{
    rank_builds(builds, options).into_iter().next()
}
