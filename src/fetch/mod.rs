//! HTTP fetching with retries and caching.
//!
//! Game-data responses are cached on disk keyed by URL only, so API keys
//! travel in headers and never end up in the cache layout. Rate limits and
//! server errors are retried with exponential backoff.

mod retry;

pub use retry::RetryPolicy;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Upstream trouble that a later attempt might not see.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(_) | FetchError::RateLimited { .. } => true,
            FetchError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Metadata stored alongside cached content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_type: Option<String>,
    pub content_length: usize,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// One outbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
    /// Serve from and store into the disk cache for this long.
    pub cache_ttl: Option<Duration>,
}

impl UpstreamRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
            basic_auth: None,
            cache_ttl: None,
        }
    }

    pub fn parse(url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self::new(url))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    pub fn cached(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

/// Source of third-party game data.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &'static str;

    /// GET a response body as text.
    async fn get_text(&self, request: &UpstreamRequest) -> Result<String, FetchError>;

    /// POST a form and return the body. Never cached.
    async fn post_form(
        &self,
        request: &UpstreamRequest,
        form: &[(&str, &str)],
    ) -> Result<String, FetchError>;
}

/// GET and deserialize a JSON body.
pub async fn get_json<T: DeserializeOwned>(
    upstream: &dyn Upstream,
    request: &UpstreamRequest,
) -> Result<T, FetchError> {
    let body = upstream.get_text(request).await?;
    serde_json::from_str(&body).map_err(|e| {
        warn!("{} returned malformed JSON for {}: {}", upstream.name(), request.url, e);
        e.into()
    })
}

/// Degrade a failed lookup to `fallback`, logging why.
pub fn soft_fail<T, E: Display>(result: Result<T, E>, fallback: T, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} failed, using fallback: {}", context, e);
            fallback
        }
    }
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Directory to cache responses
    pub cache_dir: PathBuf,

    /// Maximum content size to fetch (default 10MB)
    pub max_content_size: usize,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    pub retry: RetryPolicy,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/cache"),
            max_content_size: 10 * 1024 * 1024,
            timeout: Duration::from_secs(10),
            user_agent: concat!("game-calc/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// HTTP fetcher with local caching.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("game-calc")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Cached body for `url`, flagged stale once older than `ttl`.
    async fn read_cache(&self, url: &Url, ttl: Duration) -> Result<Option<(String, bool)>, FetchError> {
        let (body_path, meta_path) = self.cache_paths(url);
        if !body_path.exists() || !meta_path.exists() {
            return Ok(None);
        }

        let Ok(meta) =
            serde_json::from_str::<CacheMetadata>(&fs::read_to_string(&meta_path).await?)
        else {
            return Ok(None);
        };
        let stale = Utc::now()
            .signed_duration_since(meta.fetched_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false);

        Ok(Some((fs::read_to_string(&body_path).await?, stale)))
    }

    async fn write_cache(
        &self,
        url: &Url,
        body: &str,
        headers: &HeaderMap,
        ttl: Duration,
    ) -> Result<(), FetchError> {
        let (body_path, meta_path) = self.cache_paths(url);
        if let Some(dir) = body_path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut file = fs::File::create(&body_path).await?;
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };

        let fetched_at = Utc::now();
        let meta = CacheMetadata {
            url: url.to_string(),
            fetched_at,
            content_type: header("content-type"),
            content_length: body.len(),
            etag: header("etag"),
            last_modified: header("last-modified"),
            expires_at: Some(fetched_at + chrono::Duration::seconds(ttl.as_secs() as i64)),
        };
        fs::write(&meta_path, serde_json::to_string_pretty(&meta)?).await?;
        Ok(())
    }

    /// Send with retries on 429, 5xx and transport failures.
    async fn send_with_retry(
        &self,
        request: &UpstreamRequest,
        form: Option<&[(&str, &str)]>,
    ) -> Result<reqwest::Response, FetchError> {
        let policy = &self.config.retry;
        let url = &request.url;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut builder = match form {
                Some(form) => self.client.post(url.as_str()).form(form),
                None => self.client.get(url.as_str()),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some((user, password)) = &request.basic_auth {
                builder = builder.basic_auth(user, Some(password));
            }

            let can_retry = attempt < policy.max_attempts.max(1);
            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok());

                    if can_retry && RetryPolicy::should_retry_status(status) {
                        let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                            policy.rate_limit_delay(attempt - 1, retry_after)
                        } else {
                            policy.delay_for(attempt - 1)
                        };
                        warn!(
                            "{} returned {} (attempt {}/{}), retrying in {:?}",
                            url, status, attempt, policy.max_attempts, delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(Self::status_error(url, status, retry_after));
                }
                Err(e) if can_retry && RetryPolicy::should_retry_error(&e) => {
                    let delay = policy.delay_for(attempt - 1);
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}, retrying in {:?}",
                        url, attempt, policy.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn status_error(url: &Url, status: StatusCode, retry_after: Option<u64>) -> FetchError {
        match status {
            StatusCode::NOT_FOUND => FetchError::NotFound(url.to_string()),
            StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after.unwrap_or(60),
            },
            _ => FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            },
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<(HeaderMap, String), FetchError> {
        let headers = response.headers().clone();
        let content = response.bytes().await?;
        if content.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len(),
                max_size: self.config.max_content_size,
            });
        }
        Ok((headers, String::from_utf8_lossy(&content).into_owned()))
    }

    /// Body and sidecar paths: `<cache_dir>/<host>/<sha256-16>.{ext,meta.json}`.
    fn cache_paths(&self, url: &Url) -> (PathBuf, PathBuf) {
        let dir = self
            .config
            .cache_dir
            .join(url.host_str().unwrap_or("unknown"));
        let key = Self::cache_key(url);
        (
            dir.join(format!("{}.{}", key, Self::extension_for_url(url))),
            dir.join(format!("{}.meta.json", key)),
        )
    }

    fn cache_key(url: &Url) -> String {
        hex::encode(&Sha256::digest(url.as_str().as_bytes())[..8])
    }

    fn extension_for_url(url: &Url) -> &'static str {
        let path = url.path().to_lowercase();
        if path.ends_with(".json") {
            "json"
        } else if path.ends_with(".ws") {
            "csv"
        } else {
            "body"
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }
}

#[async_trait]
impl Upstream for Fetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn get_text(&self, request: &UpstreamRequest) -> Result<String, FetchError> {
        let cached = match request.cache_ttl {
            Some(ttl) => self.read_cache(&request.url, ttl).await?,
            None => None,
        };
        let stale = match cached {
            Some((body, false)) => {
                debug!("Cache hit for {}", request.url);
                return Ok(body);
            }
            Some((body, true)) => {
                debug!("Stale cache entry for {}", request.url);
                Some(body)
            }
            None => None,
        };

        info!("Fetching {}", request.url);
        let fetched = match self.send_with_retry(request, None).await {
            Ok(response) => self.read_body(response).await,
            Err(e) => Err(e),
        };
        let (headers, body) = match (fetched, stale) {
            (Ok(fetched), _) => fetched,
            (Err(e), Some(body)) if e.is_transient() => {
                warn!("{} failed, serving stale cached copy: {}", request.url, e);
                return Ok(body);
            }
            (Err(e), _) => return Err(e),
        };

        if let Some(ttl) = request.cache_ttl {
            // a failed cache write still returns the fresh body
            if let Err(e) = self.write_cache(&request.url, &body, &headers, ttl).await {
                warn!("Failed to cache {}: {}", request.url, e);
            }
        }
        Ok(body)
    }

    async fn post_form(
        &self,
        request: &UpstreamRequest,
        form: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        debug!("Posting form to {}", request.url);
        let response = self.send_with_retry(request, Some(form)).await?;
        let (_, body) = self.read_body(response).await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> FetcherConfig {
        FetcherConfig {
            cache_dir: temp_dir.path().to_path_buf(),
            max_content_size: 1024 * 1024,
            timeout: Duration::from_secs(5),
            user_agent: "test-agent".to_string(),
            retry: RetryPolicy {
                max_attempts: 3,
                initial_delay_ms: 1,
                backoff_multiplier: 2.0,
                max_delay_ms: 10,
            },
        }
    }

    /// Serve `/flaky.json`, which fails with `failures` 503s before
    /// succeeding, plus fixed-behaviour routes. Every route counts `hits`.
    async fn flaky_server(failures: usize, hits: Arc<AtomicUsize>) -> String {
        use axum::http::StatusCode as AxumStatus;
        use axum::routing::get;

        let flaky = hits.clone();
        let limited = hits.clone();
        let once = hits;
        let app = axum::Router::new()
            .route(
                "/flaky.json",
                get(move || {
                    let hits = flaky.clone();
                    async move {
                        let n = hits.fetch_add(1, Ordering::SeqCst);
                        if n < failures {
                            (AxumStatus::SERVICE_UNAVAILABLE, "busy".to_string())
                        } else {
                            (AxumStatus::OK, r#"{"ok":true}"#.to_string())
                        }
                    }
                }),
            )
            .route(
                "/missing.json",
                get(|| async { (AxumStatus::NOT_FOUND, "nope") }),
            )
            .route(
                "/limited.json",
                get(move || {
                    let hits = limited.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        (AxumStatus::TOO_MANY_REQUESTS, [("retry-after", "0")], "slow down")
                    }
                }),
            )
            .route(
                "/once.json",
                get(move || {
                    let hits = once.clone();
                    async move {
                        if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                            (AxumStatus::OK, r#"{"v":1}"#.to_string())
                        } else {
                            (AxumStatus::BAD_GATEWAY, "down".to_string())
                        }
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_cache_key_per_url() {
        let a = Fetcher::cache_key(&Url::parse("https://example.com/a?x=1").unwrap());
        let b = Fetcher::cache_key(&Url::parse("https://example.com/a?x=2").unwrap());
        assert_ne!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_extension_for_url() {
        assert_eq!(
            Fetcher::extension_for_url(
                &Url::parse("https://ddragon.leagueoflegends.com/api/versions.json").unwrap()
            ),
            "json"
        );
        assert_eq!(
            Fetcher::extension_for_url(
                &Url::parse("https://secure.runescape.com/m=hiscore_oldschool/index_lite.ws")
                    .unwrap()
            ),
            "csv"
        );
        assert_eq!(
            Fetcher::extension_for_url(&Url::parse("https://example.com/realms").unwrap()),
            "body"
        );
    }

    #[test]
    fn test_cache_path_generation() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();

        let url = Url::parse("https://ddragon.leagueoflegends.com/api/versions.json").unwrap();
        let (body, meta) = fetcher.cache_paths(&url);

        let host_dir = temp_dir.path().join("ddragon.leagueoflegends.com");
        assert!(body.starts_with(&host_dir));
        assert!(body.to_string_lossy().ends_with(".json"));
        assert_eq!(meta.parent(), body.parent());
        assert!(meta.to_string_lossy().ends_with(".meta.json"));
    }

    #[test]
    fn test_upstream_request_builder() {
        let request = UpstreamRequest::parse("https://na1.api.riotgames.com/x")
            .unwrap()
            .header("X-Riot-Token", "secret")
            .cached(Duration::from_secs(60));

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.cache_ttl, Some(Duration::from_secs(60)));
        assert!(!request.url.as_str().contains("secret"));
        assert!(UpstreamRequest::parse("not a url").is_err());
    }

    #[tokio::test]
    async fn test_get_json_malformed_body() {
        use crate::sources::mock::MockUpstream;

        let mock = MockUpstream::new().with("/versions.json", "<html>maintenance</html>");
        assert_eq!(mock.name(), "mock");
        let request = UpstreamRequest::parse("https://example.com/versions.json").unwrap();
        let result: Result<Vec<String>, _> = get_json(&mock, &request).await;
        assert!(matches!(result, Err(FetchError::Json(_))));
    }

    #[test]
    fn test_soft_fail() {
        let ok: Result<u32, String> = Ok(3);
        let err: Result<u32, String> = Err("boom".to_string());
        assert_eq!(soft_fail(ok, 0, "ok"), 3);
        assert_eq!(soft_fail(err, 0, "err"), 0);
    }

    #[tokio::test]
    async fn test_retries_then_caches() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let base = flaky_server(2, hits.clone()).await;

        let request = UpstreamRequest::parse(&format!("{}/flaky.json", base))
            .unwrap()
            .cached(Duration::from_secs(60));

        let value: serde_json::Value = get_json(&fetcher, &request).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        // second call is served from disk
        let body = fetcher.get_text(&request).await.unwrap();
        assert_eq!(body, r#"{"ok":true}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let base = flaky_server(10, hits.clone()).await;

        let request = UpstreamRequest::parse(&format!("{}/flaky.json", base)).unwrap();
        let err = fetcher.get_text(&request).await.unwrap_err();

        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();
        let base = flaky_server(0, Arc::new(AtomicUsize::new(0))).await;

        let request = UpstreamRequest::parse(&format!("{}/missing.json", base)).unwrap();
        let err = fetcher.get_text(&request).await.unwrap_err();

        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_retried_then_reported() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let base = flaky_server(0, hits.clone()).await;

        let request = UpstreamRequest::parse(&format!("{}/limited.json", base)).unwrap();
        let err = fetcher.get_text(&request).await.unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        // Retry-After from the last response, not the 60s default
        assert!(matches!(
            err,
            FetchError::RateLimited { retry_after_secs: 0, .. }
        ));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_connect_errors_are_retried() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.retry = RetryPolicy {
            max_attempts: 3,
            initial_delay_ms: 30,
            backoff_multiplier: 1.0,
            max_delay_ms: 30,
        };
        let fetcher = Fetcher::new(config).unwrap();

        // nothing listens on a port we just released
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let request = UpstreamRequest::parse(&format!("http://{}/gone.json", addr)).unwrap();
        let started = std::time::Instant::now();
        let err = fetcher.get_text(&request).await.unwrap_err();

        match err {
            FetchError::Http(e) => assert!(e.is_connect()),
            other => panic!("expected connect error, got {other:?}"),
        }
        // two backoff sleeps between three attempts
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_stale_cache_served_when_upstream_fails() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let base = flaky_server(0, hits.clone()).await;

        let request = UpstreamRequest::parse(&format!("{}/once.json", base))
            .unwrap()
            .cached(Duration::ZERO);

        assert_eq!(fetcher.get_text(&request).await.unwrap(), r#"{"v":1}"#);
        tokio::time::sleep(Duration::from_millis(20)).await;

        // the entry is stale and the refetch fails, so the old body is served
        assert_eq!(fetcher.get_text(&request).await.unwrap(), r#"{"v":1}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_stale_cache_not_used_for_not_found() {
        assert!(!FetchError::NotFound("x".to_string()).is_transient());
        assert!(!FetchError::HttpStatus { status: 403, message: "Forbidden".to_string() }.is_transient());
        assert!(FetchError::HttpStatus { status: 502, message: "Bad Gateway".to_string() }.is_transient());

        let temp_dir = TempDir::new().unwrap();
        let fetcher = Fetcher::new(test_config(&temp_dir)).unwrap();
        let base = flaky_server(0, Arc::new(AtomicUsize::new(0))).await;
        let request = UpstreamRequest::parse(&format!("{}/missing.json", base))
            .unwrap()
            .cached(Duration::ZERO);
        assert!(matches!(
            fetcher.get_text(&request).await.unwrap_err(),
            FetchError::NotFound(_)
        ));
    }
}
