//! Blizzard Battle.net client for World of Warcraft game data.
//!
//! Uses the OAuth client-credentials flow. The access token is shared across
//! requests and refreshed shortly before it expires.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::SourceError;
use crate::fetch::{get_json, FetchError, Upstream, UpstreamRequest};
use crate::models::{Realm, RealmIndex};

pub const DEFAULT_OAUTH_URL: &str = "https://oauth.battle.net/token";
pub const SUPPORTED_REGIONS: [&str; 4] = ["us", "eu", "kr", "tw"];

/// Refresh this many seconds before the token expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

pub struct BlizzardClient {
    upstream: Arc<dyn Upstream>,
    client_id: String,
    client_secret: String,
    region: String,
    locale: String,
    oauth_url: String,
    cache_ttl: Duration,
    token: RwLock<Option<CachedToken>>,
}

impl BlizzardClient {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        region: &str,
        locale: &str,
    ) -> Result<Self, SourceError> {
        let region = region.trim().to_lowercase();
        if !SUPPORTED_REGIONS.contains(&region.as_str()) {
            return Err(SourceError::InvalidInput(format!(
                "unsupported Blizzard region '{}'",
                region
            )));
        }
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(SourceError::MissingCredentials("Blizzard client id/secret"));
        }

        Ok(Self {
            upstream,
            client_id,
            client_secret,
            region,
            locale: locale.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            cache_ttl: Duration::from_secs(3600),
            token: RwLock::new(None),
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn api_base(&self) -> String {
        format!("https://{}.api.blizzard.com", self.region)
    }

    /// Current access token, requesting a new one when missing or stale.
    async fn access_token(&self) -> Result<String, SourceError> {
        let now = Utc::now();
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let mut guard = self.token.write().await;
        // another task may have refreshed while we waited
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        info!("Requesting Blizzard access token");
        let request = UpstreamRequest::parse(&self.oauth_url)?
            .basic_auth(self.client_id.clone(), self.client_secret.clone());
        let body = self
            .upstream
            .post_form(&request, &[("grant_type", "client_credentials")])
            .await
            .map_err(|e| match e {
                FetchError::HttpStatus { status: 401, .. } => {
                    SourceError::MissingCredentials("Blizzard credentials rejected")
                }
                other => other.into(),
            })?;
        let response: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))?;

        let token = CachedToken {
            access_token: response.access_token,
            expires_at: now + chrono::Duration::seconds(response.expires_in),
        };
        debug!("Blizzard token valid until {}", token.expires_at);
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    /// Realms for the configured region, sorted by name.
    pub async fn realms(&self) -> Result<Vec<Realm>, SourceError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/data/wow/realm/index?namespace=dynamic-{}&locale={}",
            self.api_base(),
            self.region,
            self.locale
        );
        let request = UpstreamRequest::parse(&url)?
            .header("Authorization", format!("Bearer {}", token))
            .cached(self.cache_ttl);
        let index: RealmIndex = get_json(self.upstream.as_ref(), &request).await?;
        Ok(index.into_realms(&self.locale))
    }
}
