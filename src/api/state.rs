use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::fetch::{FetchError, Fetcher, FetcherConfig, RetryPolicy, Upstream};
use crate::sources::blizzard::BlizzardClient;
use crate::sources::ddragon::DataDragonClient;
use crate::sources::hiscores::HiscoresClient;
use crate::sources::riot::RiotClient;
use crate::sources::SourceError;
use crate::storage::StorageConfig;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageConfig>,
    pub config: Arc<AppConfig>,
    pub riot: Option<Arc<RiotClient>>,
    pub ddragon: Arc<DataDragonClient>,
    pub blizzard: Option<Arc<BlizzardClient>>,
    pub hiscores: Arc<HiscoresClient>,
}

impl AppState {
    /// State backed by the caching HTTP fetcher.
    pub fn from_config(config: AppConfig) -> Result<Self, FetchError> {
        let storage = StorageConfig::new(config.data_dir.clone());
        let fetcher = Fetcher::new(FetcherConfig {
            cache_dir: storage.cache_dir(),
            timeout: Duration::from_secs(config.http.timeout_seconds),
            retry: RetryPolicy {
                max_attempts: config.http.max_attempts,
                initial_delay_ms: config.http.initial_delay_ms,
                ..RetryPolicy::default()
            },
            ..FetcherConfig::default()
        })?;
        info!("Caching upstream responses in {:?}", fetcher.cache_dir());
        Ok(Self::with_upstream(config, Arc::new(fetcher)))
    }

    /// State with every client sharing `upstream`.
    pub fn with_upstream(config: AppConfig, upstream: Arc<dyn Upstream>) -> Self {
        let storage = StorageConfig::new(config.data_dir.clone());

        let riot = config.riot.api_key.as_ref().map(|key| {
            Arc::new(
                RiotClient::new(upstream.clone(), key.clone())
                    .with_cache_ttl(config.cache.profile_ttl()),
            )
        });
        if riot.is_none() {
            debug!("No Riot API key configured, profile lookups disabled");
        }

        let blizzard = match (&config.blizzard.client_id, &config.blizzard.client_secret) {
            (Some(id), Some(secret)) => match BlizzardClient::new(
                upstream.clone(),
                id.clone(),
                secret.clone(),
                &config.blizzard.region,
                &config.blizzard.locale,
            ) {
                Ok(client) => Some(Arc::new(client.with_cache_ttl(config.cache.static_ttl()))),
                Err(e) => {
                    debug!("Blizzard client disabled: {}", e);
                    None
                }
            },
            _ => None,
        };

        let ddragon = DataDragonClient::new(upstream.clone()).with_cache_ttl(config.cache.static_ttl());
        let hiscores = HiscoresClient::new(upstream).with_cache_ttl(config.cache.hiscores_ttl());

        Self {
            storage: Arc::new(storage),
            config: Arc::new(config),
            riot,
            ddragon: Arc::new(ddragon),
            blizzard,
            hiscores: Arc::new(hiscores),
        }
    }

    pub fn riot(&self) -> Result<&RiotClient, SourceError> {
        self.riot
            .as_deref()
            .ok_or(SourceError::MissingCredentials("RIOT_API_KEY is not configured"))
    }

    pub fn blizzard(&self) -> Result<&BlizzardClient, SourceError> {
        self.blizzard.as_deref().ok_or(SourceError::MissingCredentials(
            "BLIZZARD_CLIENT_ID and BLIZZARD_CLIENT_SECRET are not configured",
        ))
    }
}
