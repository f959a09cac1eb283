//! Data Dragon static League of Legends data.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::SourceError;
use crate::fetch::{get_json, FetchError, Upstream, UpstreamRequest};
use crate::models::ChampionSummary;

pub const DEFAULT_DDRAGON_BASE: &str = "https://ddragon.leagueoflegends.com";

fn patch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").unwrap())
}

#[derive(Debug, Deserialize)]
struct ChampionFile {
    data: HashMap<String, ChampionSummary>,
}

pub struct DataDragonClient {
    upstream: Arc<dyn Upstream>,
    base: String,
    cache_ttl: Duration,
}

impl DataDragonClient {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            base: DEFAULT_DDRAGON_BASE.to_string(),
            cache_ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Newest published patch.
    pub async fn latest_version(&self) -> Result<String, SourceError> {
        let request =
            UpstreamRequest::parse(&format!("{}/api/versions.json", self.base))?.cached(self.cache_ttl);
        let versions: Vec<String> = get_json(self.upstream.as_ref(), &request).await?;
        versions
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Parse("empty version list".to_string()))
    }

    /// Champion list for a patch, sorted by display name.
    pub async fn champions(&self, version: &str) -> Result<Vec<ChampionSummary>, SourceError> {
        let version = version.trim();
        if !patch_pattern().is_match(version) {
            return Err(SourceError::InvalidInput(format!(
                "'{}' is not a patch version",
                version
            )));
        }

        let url = format!("{}/cdn/{}/data/en_US/champion.json", self.base, version);
        let request = UpstreamRequest::parse(&url)?.cached(self.cache_ttl);
        let file: ChampionFile = get_json(self.upstream.as_ref(), &request)
            .await
            .map_err(|e| match e {
                FetchError::NotFound(_) => {
                    SourceError::NotFound(format!("champion data for patch {}", version))
                }
                other => other.into(),
            })?;

        let mut champions: Vec<ChampionSummary> = file.data.into_values().collect();
        champions.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Loaded {} champions for {}", champions.len(), version);
        Ok(champions)
    }
}
