//! REST API endpoints.
//!
//! Axum-based HTTP API exposing the calculators, ranked meta builds and
//! proxied game data lookups.

pub mod routes;
pub mod state;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        FromRequestParts,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::fetch::FetchError;
use crate::sources::SourceError;
use crate::storage::StorageError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(what) => ApiError::NotFound(what),
            SourceError::InvalidInput(msg) => ApiError::BadRequest(msg),
            SourceError::MissingCredentials(what) => ApiError::Unavailable(what.to_string()),
            SourceError::Parse(msg) => ApiError::BadGateway(msg),
            SourceError::Fetch(e @ FetchError::RateLimited { .. }) => {
                ApiError::Unavailable(e.to_string())
            }
            SourceError::Fetch(e @ (FetchError::InvalidUrl(_) | FetchError::Io(_))) => {
                ApiError::Internal(e.to_string())
            }
            SourceError::Fetch(e) => ApiError::BadGateway(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Query` extractor whose rejection is a JSON `ApiError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` extractor whose rejection is a JSON `ApiError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Cache-Control` policy attached to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    NoStore,
    Public { max_age_secs: u64 },
}

impl CachePolicy {
    pub const fn public(max_age_secs: u64) -> Self {
        CachePolicy::Public { max_age_secs }
    }

    pub fn header_value(&self) -> String {
        match self {
            CachePolicy::NoStore => "no-store".to_string(),
            CachePolicy::Public { max_age_secs } => format!("public, max-age={}", max_age_secs),
        }
    }
}

impl IntoResponseParts for CachePolicy {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Ok(value) = HeaderValue::from_str(&self.header_value()) {
            res.headers_mut().insert(header::CACHE_CONTROL, value);
        }
        Ok(res)
    }
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(50).clamp(1, 100),
        }
    }

    /// Saturates, so an absurd `page` yields an empty slice.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// The slice of `items` on this page.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect()
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);
    if origin.trim() == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Assemble the application router.
pub fn build_router(state: AppState) -> Router {
    let fixtures = ServeDir::new(state.storage.fixtures_dir());
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/calc/lol/dps", get(routes::calc::lol_dps))
        .route("/api/calc/lol/kill-check", get(routes::calc::lol_kill_check))
        .route("/api/calc/lol/ehp", get(routes::calc::lol_ehp))
        .route("/api/calc/osrs/dps", get(routes::calc::osrs_dps))
        .route("/api/calc/cod/ttk", get(routes::calc::cod_ttk))
        .route("/api/calc/fortnite/ttk", get(routes::calc::fortnite_ttk))
        .route("/api/builds", get(routes::builds::list_builds))
        .route("/api/builds/best", get(routes::builds::best_build))
        .route("/api/osrs/monsters", get(routes::osrs::list_monsters))
        .route("/api/osrs/hiscores/:player", get(routes::osrs::hiscores))
        .route("/api/lol/versions/latest", get(routes::lol::latest_version))
        .route("/api/lol/champions", get(routes::lol::champions))
        .route("/api/lol/profile/:platform/:riot_id", get(routes::lol::profile))
        .route("/api/wow/realms", get(routes::wow::realms))
        .nest_service("/fixtures", fixtures)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
