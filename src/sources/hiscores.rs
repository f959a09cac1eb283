//! Old School RuneScape hiscores lookup.
//!
//! `index_lite.ws` returns one `rank,level,xp` line per skill in a fixed
//! order, followed by activity lines we ignore.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use url::Url;

use super::SourceError;
use crate::fetch::{FetchError, Upstream, UpstreamRequest};
use crate::models::{Hiscores, Skill, SkillEntry};

pub const DEFAULT_HISCORES_URL: &str =
    "https://secure.runescape.com/m=hiscore_oldschool/index_lite.ws";

fn player_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9 _-]{1,12}$").unwrap())
}

pub fn validate_player_name(name: &str) -> Result<&str, SourceError> {
    let name = name.trim();
    if player_pattern().is_match(name) {
        Ok(name)
    } else {
        Err(SourceError::InvalidInput(format!(
            "'{}' is not a valid player name",
            name
        )))
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, line: usize) -> Result<T, SourceError> {
    value
        .trim()
        .parse()
        .map_err(|_| SourceError::Parse(format!("hiscores line {}: bad value '{}'", line + 1, value)))
}

/// Parse the skill section of an `index_lite.ws` body.
pub fn parse_hiscores(player: &str, body: &str) -> Result<Hiscores, SourceError> {
    let lines: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < Skill::ALL.len() {
        return Err(SourceError::Parse(format!(
            "expected {} skill lines, got {}",
            Skill::ALL.len(),
            lines.len()
        )));
    }

    let mut skills = Vec::with_capacity(Skill::ALL.len());
    for (i, (skill, line)) in Skill::ALL.iter().zip(lines.iter()).enumerate() {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            return Err(SourceError::Parse(format!(
                "hiscores line {}: expected rank,level,xp",
                i + 1
            )));
        }
        let rank: i64 = parse_field(fields[0], i)?;
        let level: i64 = parse_field(fields[1], i)?;
        let xp: i64 = parse_field(fields[2], i)?;

        skills.push(SkillEntry {
            skill: *skill,
            rank: u32::try_from(rank).ok().filter(|_| rank >= 1),
            // unranked skills report -1; the floor is level 1
            level: u32::try_from(level).unwrap_or(1).max(1),
            xp: u64::try_from(xp).ok(),
        });
    }

    Ok(Hiscores {
        player: player.to_string(),
        skills,
    })
}

pub struct HiscoresClient {
    upstream: Arc<dyn Upstream>,
    url: String,
    cache_ttl: Duration,
}

impl HiscoresClient {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            url: DEFAULT_HISCORES_URL.to_string(),
            cache_ttl: Duration::from_secs(300),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub async fn lookup(&self, player: &str) -> Result<Hiscores, SourceError> {
        let player = validate_player_name(player)?;

        let mut url = Url::parse(&self.url)
            .map_err(|e| FetchError::InvalidUrl(format!("Bad hiscores URL: {}", e)))?;
        url.query_pairs_mut().append_pair("player", player);

        let request = UpstreamRequest::new(url).cached(self.cache_ttl);
        let body = self.upstream.get_text(&request).await.map_err(|e| match e {
            FetchError::NotFound(_) => SourceError::NotFound(format!("player '{}'", player)),
            other => other.into(),
        })?;

        parse_hiscores(player, &body)
    }
}
