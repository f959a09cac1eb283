//! Riot Games API payloads and the summoner profile built from them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    pub puuid: String,
    pub profile_icon_id: u32,
    pub summoner_level: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub queue_type: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(default)]
    pub game_duration: u64,
    #[serde(default)]
    pub queue_id: u32,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub puuid: String,
    pub champion_name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,
}

/// Champion entry from Data Dragon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionSummary {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `(kills + assists) / max(deaths, 1)`
pub fn kda_ratio(kills: u32, deaths: u32, assists: u32) -> f64 {
    (kills + assists) as f64 / deaths.max(1) as f64
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedSummary {
    pub queue_type: String,
    pub tier: Option<String>,
    pub rank: Option<String>,
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

impl From<LeagueEntry> for RankedSummary {
    fn from(entry: LeagueEntry) -> Self {
        let games = entry.wins + entry.losses;
        Self {
            win_rate: super::win_rate(entry.wins, games),
            queue_type: entry.queue_type,
            tier: entry.tier,
            rank: entry.rank,
            league_points: entry.league_points,
            wins: entry.wins,
            losses: entry.losses,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub match_id: String,
    pub queue_id: u32,
    pub champion: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub kda: f64,
    pub win: bool,
    pub duration_seconds: u64,
}

impl MatchSummary {
    /// Summarise a match from the point of view of `puuid`.
    pub fn from_match(dto: &MatchDto, puuid: &str) -> Option<Self> {
        let p = dto.info.participants.iter().find(|p| p.puuid == puuid)?;
        Some(Self {
            match_id: dto.metadata.match_id.clone(),
            queue_id: dto.info.queue_id,
            champion: p.champion_name.clone(),
            kills: p.kills,
            deaths: p.deaths,
            assists: p.assists,
            kda: kda_ratio(p.kills, p.deaths, p.assists),
            win: p.win,
            duration_seconds: dto.info.game_duration,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummonerProfile {
    pub riot_id: String,
    pub puuid: String,
    pub platform: String,
    pub summoner_level: u64,
    pub profile_icon_id: u32,
    pub ranked: Vec<RankedSummary>,
    pub recent_matches: Vec<MatchSummary>,
    pub recent_win_rate: Option<f64>,
    pub average_kda: Option<f64>,
}

impl SummonerProfile {
    /// Fill the aggregate fields from `recent_matches`.
    pub fn with_recent_stats(mut self) -> Self {
        let n = self.recent_matches.len();
        if n == 0 {
            self.recent_win_rate = None;
            self.average_kda = None;
            return self;
        }
        let wins = self.recent_matches.iter().filter(|m| m.win).count();
        let kda_sum: f64 = self.recent_matches.iter().map(|m| m.kda).sum();
        self.recent_win_rate = Some(wins as f64 / n as f64);
        self.average_kda = Some(kda_sum / n as f64);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kda_ratio() {
        assert_eq!(kda_ratio(10, 2, 6), 8.0);
        // deathless games divide by one
        assert_eq!(kda_ratio(3, 0, 4), 7.0);
    }

    #[test]
    fn test_account_deserialization() {
        let json = r#"{"puuid":"abc","gameName":"Faker","tagLine":"KR1"}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.game_name.as_deref(), Some("Faker"));
        assert_eq!(account.tag_line.as_deref(), Some("KR1"));
    }

    #[test]
    fn test_ranked_summary_win_rate() {
        let entry = LeagueEntry {
            queue_type: "RANKED_SOLO_5x5".to_string(),
            tier: Some("GOLD".to_string()),
            rank: Some("II".to_string()),
            league_points: 44,
            wins: 30,
            losses: 20,
        };
        let summary = RankedSummary::from(entry);
        assert!((summary.win_rate - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_match_summary_for_participant() {
        let json = r#"{
            "metadata": {"matchId": "NA1_1"},
            "info": {
                "gameDuration": 1800,
                "queueId": 420,
                "participants": [
                    {"puuid": "other", "championName": "Ahri", "kills": 1, "deaths": 1, "assists": 1, "win": false},
                    {"puuid": "me", "championName": "Jinx", "kills": 8, "deaths": 2, "assists": 4, "win": true}
                ]
            }
        }"#;
        let dto: MatchDto = serde_json::from_str(json).unwrap();

        let summary = MatchSummary::from_match(&dto, "me").unwrap();
        assert_eq!(summary.champion, "Jinx");
        assert_eq!(summary.kda, 6.0);
        assert!(summary.win);
        assert!(MatchSummary::from_match(&dto, "missing").is_none());
    }
}
