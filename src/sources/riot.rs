//! Riot Games API client.
//!
//! Platform routes (`na1`, `euw1`, ...) serve summoner and league data;
//! regional routes (`americas`, `europe`, ...) serve accounts and matches.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use super::SourceError;
use crate::fetch::{get_json, soft_fail, FetchError, Upstream, UpstreamRequest};
use crate::models::{
    Account, LeagueEntry, MatchDto, MatchSummary, RankedSummary, Summoner, SummonerProfile,
};

pub const MAX_MATCH_COUNT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionalRoute {
    Americas,
    Europe,
    Asia,
    Sea,
}

impl RegionalRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionalRoute::Americas => "americas",
            RegionalRoute::Europe => "europe",
            RegionalRoute::Asia => "asia",
            RegionalRoute::Sea => "sea",
        }
    }

    /// Account lookups are only served from americas, europe and asia.
    pub fn account_route(&self) -> RegionalRoute {
        match self {
            RegionalRoute::Sea => RegionalRoute::Asia,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Na1,
    Br1,
    La1,
    La2,
    Euw1,
    Eun1,
    Tr1,
    Ru,
    Me1,
    Kr,
    Jp1,
    Oc1,
    Ph2,
    Sg2,
    Th2,
    Tw2,
    Vn2,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Na1 => "na1",
            Platform::Br1 => "br1",
            Platform::La1 => "la1",
            Platform::La2 => "la2",
            Platform::Euw1 => "euw1",
            Platform::Eun1 => "eun1",
            Platform::Tr1 => "tr1",
            Platform::Ru => "ru",
            Platform::Me1 => "me1",
            Platform::Kr => "kr",
            Platform::Jp1 => "jp1",
            Platform::Oc1 => "oc1",
            Platform::Ph2 => "ph2",
            Platform::Sg2 => "sg2",
            Platform::Th2 => "th2",
            Platform::Tw2 => "tw2",
            Platform::Vn2 => "vn2",
        }
    }

    pub fn regional(&self) -> RegionalRoute {
        match self {
            Platform::Na1 | Platform::Br1 | Platform::La1 | Platform::La2 => {
                RegionalRoute::Americas
            }
            Platform::Euw1 | Platform::Eun1 | Platform::Tr1 | Platform::Ru | Platform::Me1 => {
                RegionalRoute::Europe
            }
            Platform::Kr | Platform::Jp1 => RegionalRoute::Asia,
            Platform::Oc1
            | Platform::Ph2
            | Platform::Sg2
            | Platform::Th2
            | Platform::Tw2
            | Platform::Vn2 => RegionalRoute::Sea,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = SourceError;

    /// Accepts platform ids and the usual short region names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let platform = match s.trim().to_lowercase().as_str() {
            "na1" | "na" => Platform::Na1,
            "br1" | "br" => Platform::Br1,
            "la1" | "lan" => Platform::La1,
            "la2" | "las" => Platform::La2,
            "euw1" | "euw" => Platform::Euw1,
            "eun1" | "eune" => Platform::Eun1,
            "tr1" | "tr" => Platform::Tr1,
            "ru" => Platform::Ru,
            "me1" | "me" => Platform::Me1,
            "kr" => Platform::Kr,
            "jp1" | "jp" => Platform::Jp1,
            "oc1" | "oce" => Platform::Oc1,
            "ph2" | "ph" => Platform::Ph2,
            "sg2" | "sg" => Platform::Sg2,
            "th2" | "th" => Platform::Th2,
            "tw2" | "tw" => Platform::Tw2,
            "vn2" | "vn" => Platform::Vn2,
            other => {
                return Err(SourceError::InvalidInput(format!(
                    "unknown platform '{}'",
                    other
                )))
            }
        };
        Ok(platform)
    }
}

/// `GameName#TAG`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

fn riot_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([^#]{3,16})[#-]([A-Za-z0-9]{2,5})$").unwrap())
}

impl RiotId {
    /// Parse `Name#TAG`, or `Name-TAG` as used in URLs.
    pub fn parse(s: &str) -> Result<Self, SourceError> {
        let s = s.trim();
        let caps = riot_id_pattern()
            .captures(s)
            .ok_or_else(|| SourceError::InvalidInput(format!("'{}' is not a Riot ID", s)))?;
        let game_name = caps[1].trim().to_string();
        if game_name.chars().count() < 3 {
            return Err(SourceError::InvalidInput(format!("'{}' is not a Riot ID", s)));
        }
        Ok(Self {
            game_name,
            tag_line: caps[2].to_string(),
        })
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

/// Riot API client.
pub struct RiotClient {
    upstream: Arc<dyn Upstream>,
    api_key: String,
    api_host: String,
    cache_ttl: Duration,
}

impl RiotClient {
    pub fn new(upstream: Arc<dyn Upstream>, api_key: impl Into<String>) -> Self {
        Self {
            upstream,
            api_key: api_key.into(),
            api_host: "api.riotgames.com".to_string(),
            cache_ttl: Duration::from_secs(120),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn url(&self, route: &str, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!("https://{}.{}/", route, self.api_host))
            .map_err(|e| FetchError::InvalidUrl(format!("Bad Riot URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl("Riot URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, url: Url, ttl: Duration) -> UpstreamRequest {
        UpstreamRequest::new(url)
            .header("X-Riot-Token", self.api_key.clone())
            .cached(ttl)
    }

    pub async fn account_by_riot_id(
        &self,
        riot_id: &RiotId,
        route: RegionalRoute,
    ) -> Result<Account, SourceError> {
        let url = self.url(
            route.account_route().as_str(),
            &[
                "riot",
                "account",
                "v1",
                "accounts",
                "by-riot-id",
                &riot_id.game_name,
                &riot_id.tag_line,
            ],
        )?;
        get_json(self.upstream.as_ref(), &self.request(url, self.cache_ttl))
            .await
            .map_err(|e| match e {
                FetchError::NotFound(_) => SourceError::NotFound(format!("Riot ID {}", riot_id)),
                other => other.into(),
            })
    }

    pub async fn summoner_by_puuid(
        &self,
        platform: Platform,
        puuid: &str,
    ) -> Result<Summoner, SourceError> {
        let url = self.url(
            platform.as_str(),
            &["lol", "summoner", "v4", "summoners", "by-puuid", puuid],
        )?;
        Ok(get_json(self.upstream.as_ref(), &self.request(url, self.cache_ttl)).await?)
    }

    pub async fn league_entries(
        &self,
        platform: Platform,
        puuid: &str,
    ) -> Result<Vec<LeagueEntry>, SourceError> {
        let url = self.url(
            platform.as_str(),
            &["lol", "league", "v4", "entries", "by-puuid", puuid],
        )?;
        Ok(get_json(self.upstream.as_ref(), &self.request(url, self.cache_ttl)).await?)
    }

    pub async fn match_ids(
        &self,
        route: RegionalRoute,
        puuid: &str,
        count: u32,
    ) -> Result<Vec<String>, SourceError> {
        let mut url = self.url(
            route.as_str(),
            &["lol", "match", "v5", "matches", "by-puuid", puuid, "ids"],
        )?;
        url.query_pairs_mut()
            .append_pair("start", "0")
            .append_pair("count", &count.clamp(1, MAX_MATCH_COUNT).to_string());
        Ok(get_json(self.upstream.as_ref(), &self.request(url, self.cache_ttl)).await?)
    }

    pub async fn match_by_id(
        &self,
        route: RegionalRoute,
        match_id: &str,
    ) -> Result<MatchDto, SourceError> {
        let url = self.url(route.as_str(), &["lol", "match", "v5", "matches", match_id])?;
        // finished matches never change
        let ttl = Duration::from_secs(24 * 3600);
        Ok(get_json(self.upstream.as_ref(), &self.request(url, ttl)).await?)
    }

    /// Build a summoner profile.
    ///
    /// The account and summoner are required; ranked entries and match
    /// history degrade to empty on failure.
    pub async fn lookup_profile(
        &self,
        riot_id: &RiotId,
        platform: Platform,
        match_count: u32,
    ) -> Result<SummonerProfile, SourceError> {
        let route = platform.regional();
        info!("Looking up {} on {}", riot_id, platform);

        let account = self.account_by_riot_id(riot_id, route).await?;
        let summoner = self.summoner_by_puuid(platform, &account.puuid).await?;

        let ranked = soft_fail(
            self.league_entries(platform, &account.puuid).await,
            Vec::new(),
            "League entries",
        );

        let match_ids = if match_count == 0 {
            Vec::new()
        } else {
            soft_fail(
                self.match_ids(route, &account.puuid, match_count).await,
                Vec::new(),
                "Match history",
            )
        };

        let mut recent_matches = Vec::with_capacity(match_ids.len());
        for match_id in &match_ids {
            match self.match_by_id(route, match_id).await {
                Ok(dto) => {
                    if let Some(summary) = MatchSummary::from_match(&dto, &account.puuid) {
                        recent_matches.push(summary);
                    }
                }
                Err(e) => warn!("Skipping match {}: {}", match_id, e),
            }
        }

        let riot_id = match (&account.game_name, &account.tag_line) {
            (Some(name), Some(tag)) => format!("{}#{}", name, tag),
            _ => riot_id.to_string(),
        };

        Ok(SummonerProfile {
            riot_id,
            puuid: account.puuid,
            platform: platform.to_string(),
            summoner_level: summoner.summoner_level,
            profile_icon_id: summoner.profile_icon_id,
            ranked: ranked.into_iter().map(RankedSummary::from).collect(),
            recent_matches,
            recent_win_rate: None,
            average_kda: None,
        }
        .with_recent_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::MockUpstream;

    const ACCOUNT: &str = r#"{"puuid":"p-123","gameName":"Hide on bush","tagLine":"KR1"}"#;
    const SUMMONER: &str = r#"{"puuid":"p-123","profileIconId":6,"summonerLevel":812}"#;
    const LEAGUE: &str = r#"[{"queueType":"RANKED_SOLO_5x5","tier":"CHALLENGER","rank":"I","leaguePoints":1200,"wins":300,"losses":200}]"#;
    const IDS: &str = r#"["KR_1","KR_2"]"#;
    const MATCH_1: &str = r#"{"metadata":{"matchId":"KR_1"},"info":{"gameDuration":1500,"queueId":420,"participants":[
        {"puuid":"p-123","championName":"Azir","kills":5,"deaths":1,"assists":7,"win":true}]}}"#;

    fn client(mock: MockUpstream) -> (Arc<MockUpstream>, RiotClient) {
        let mock = Arc::new(mock);
        let client = RiotClient::new(mock.clone(), "RGAPI-test");
        (mock, client)
    }

    #[test]
    fn test_platform_routing() {
        assert_eq!(Platform::Na1.regional(), RegionalRoute::Americas);
        assert_eq!(Platform::Euw1.regional(), RegionalRoute::Europe);
        assert_eq!(Platform::Kr.regional(), RegionalRoute::Asia);
        assert_eq!(Platform::Oc1.regional(), RegionalRoute::Sea);
        assert_eq!(RegionalRoute::Sea.account_route(), RegionalRoute::Asia);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("EUW".parse::<Platform>().unwrap(), Platform::Euw1);
        assert_eq!("na1".parse::<Platform>().unwrap(), Platform::Na1);
        assert_eq!(" oce ".parse::<Platform>().unwrap(), Platform::Oc1);
        assert!("atlantis".parse::<Platform>().is_err());
    }

    #[test]
    fn test_riot_id_parse() {
        let id = RiotId::parse("Hide on bush#KR1").unwrap();
        assert_eq!(id.game_name, "Hide on bush");
        assert_eq!(id.tag_line, "KR1");

        // URL form uses the last dash
        let id = RiotId::parse("Doublelift-NA1").unwrap();
        assert_eq!(id.game_name, "Doublelift");
        assert_eq!(id.to_string(), "Doublelift#NA1");
    }

    #[test]
    fn test_riot_id_parse_rejects() {
        assert!(RiotId::parse("NoTag").is_err());
        assert!(RiotId::parse("ab#NA1").is_err());
        assert!(RiotId::parse("Name#TOOLONGTAG").is_err());
    }

    #[test]
    fn test_riot_id_name_cannot_contain_hash() {
        assert!(RiotId::parse("abc#def#KR1").is_err());
        assert!(RiotId::parse("a#b#KR1").is_err());
        // dashes in the name are fine, the last one splits
        let id = RiotId::parse("Big-Name-EUW").unwrap();
        assert_eq!(id.game_name, "Big-Name");
        assert_eq!(id.tag_line, "EUW");
    }

    #[test]
    fn test_url_encodes_segments() {
        let (_, client) = client(MockUpstream::new());
        let url = client
            .url("asia", &["riot", "account", "v1", "accounts", "by-riot-id", "Hide on bush", "KR1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://asia.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Hide%20on%20bush/KR1"
        );
    }

    #[tokio::test]
    async fn test_lookup_profile() {
        let mock = MockUpstream::new()
            .with("/by-riot-id/", ACCOUNT)
            .with("/summoners/by-puuid/", SUMMONER)
            .with("/entries/by-puuid/", LEAGUE)
            .with("/ids", IDS)
            .with("/matches/KR_1", MATCH_1)
            .with_status("/matches/KR_2", 503);
        let (mock, client) = client(mock);

        let riot_id = RiotId::parse("Hide on bush#KR1").unwrap();
        let profile = client.lookup_profile(&riot_id, Platform::Kr, 5).await.unwrap();

        assert_eq!(profile.riot_id, "Hide on bush#KR1");
        assert_eq!(profile.summoner_level, 812);
        assert_eq!(profile.ranked.len(), 1);
        assert!((profile.ranked[0].win_rate - 0.6).abs() < 1e-12);
        // KR_2 failed and was skipped
        assert_eq!(profile.recent_matches.len(), 1);
        assert_eq!(profile.recent_win_rate, Some(1.0));
        assert_eq!(profile.average_kda, Some(12.0));

        let requests = mock.requests.lock().unwrap();
        assert!(requests
            .iter()
            .all(|r| r.headers.iter().any(|(k, v)| k == "X-Riot-Token" && v == "RGAPI-test")));
        assert!(requests[0].url.as_str().starts_with("https://asia."));
    }

    #[tokio::test]
    async fn test_lookup_profile_unknown_account() {
        let (_, client) = client(MockUpstream::new());
        let riot_id = RiotId::parse("Nobody#0000").unwrap();

        let err = client
            .lookup_profile(&riot_id, Platform::Na1, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lookup_profile_soft_fails_ranked() {
        let mock = MockUpstream::new()
            .with("/by-riot-id/", ACCOUNT)
            .with("/summoners/by-puuid/", SUMMONER)
            .with_status("/entries/by-puuid/", 500);
        let (_, client) = client(mock);

        let riot_id = RiotId::parse("Hide on bush#KR1").unwrap();
        let profile = client.lookup_profile(&riot_id, Platform::Kr, 0).await.unwrap();

        assert!(profile.ranked.is_empty());
        assert!(profile.recent_matches.is_empty());
        assert!(profile.recent_win_rate.is_none());
    }
}
