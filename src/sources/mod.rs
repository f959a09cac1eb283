//! Third-party game data clients.
//!
//! Each client wraps an [`Upstream`](crate::fetch::Upstream) and turns raw
//! responses into typed models:
//! - Riot Games account, summoner, league and match APIs
//! - Data Dragon static champion data
//! - Blizzard World of Warcraft realm index
//! - Old School RuneScape hiscores

pub mod blizzard;
pub mod ddragon;
pub mod hiscores;
pub mod riot;

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors from game data lookups.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Fetch error: {0}")]
    Fetch(FetchError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl From<FetchError> for SourceError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(url) => SourceError::NotFound(url),
            FetchError::Json(e) => SourceError::Parse(e.to_string()),
            other => SourceError::Fetch(other),
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Canned upstream responses keyed by URL substring.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::fetch::{FetchError, Upstream, UpstreamRequest};

    pub struct MockUpstream {
        routes: Vec<(String, Result<String, u16>)>,
        pub requests: Mutex<Vec<UpstreamRequest>>,
    }

    impl MockUpstream {
        pub fn new() -> Self {
            Self {
                routes: Vec::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Respond with `body` to URLs containing `pattern`.
        pub fn with(mut self, pattern: &str, body: &str) -> Self {
            self.routes.push((pattern.to_string(), Ok(body.to_string())));
            self
        }

        /// Respond with an HTTP status to URLs containing `pattern`.
        pub fn with_status(mut self, pattern: &str, status: u16) -> Self {
            self.routes.push((pattern.to_string(), Err(status)));
            self
        }

        fn respond(&self, request: &UpstreamRequest) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            let url = request.url.as_str();
            match self.routes.iter().find(|(pattern, _)| url.contains(pattern.as_str())) {
                Some((_, Ok(body))) => Ok(body.clone()),
                Some((_, Err(404))) | None => Err(FetchError::NotFound(url.to_string())),
                Some((_, Err(status))) => Err(FetchError::HttpStatus {
                    status: *status,
                    message: "mock".to_string(),
                }),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Upstream for MockUpstream {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn get_text(&self, request: &UpstreamRequest) -> Result<String, FetchError> {
            self.respond(request)
        }

        async fn post_form(
            &self,
            request: &UpstreamRequest,
            _form: &[(&str, &str)],
        ) -> Result<String, FetchError> {
            self.respond(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_through() {
        let err = SourceError::from(FetchError::NotFound("https://x".to_string()));
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_status_maps_to_fetch() {
        let err = SourceError::from(FetchError::HttpStatus {
            status: 503,
            message: "Service Unavailable".to_string(),
        });
        assert!(matches!(err, SourceError::Fetch(_)));
    }
}
