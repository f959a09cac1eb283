use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, ApiQuery, CachePolicy, Pagination, PaginationMeta};
use crate::calculate::ranking::{self, BuildFilter, RankingOptions, DEFAULT_Z};
use crate::models::RankedBuild;
use crate::storage::load_meta_builds;

const BUILDS_CACHE: CachePolicy = CachePolicy::public(300);

#[derive(Debug, Deserialize)]
pub struct BuildsParams {
    pub champion: Option<String>,
    pub role: Option<String>,
    pub patch: Option<String>,
    pub mode: Option<String>,
    pub min_games: Option<u32>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl BuildsParams {
    fn filter(&self) -> BuildFilter {
        BuildFilter {
            champion: self.champion.clone(),
            role: self.role.clone(),
            patch: self.patch.clone(),
            mode: self.mode.clone(),
        }
    }

    fn options(&self) -> RankingOptions {
        RankingOptions {
            z: DEFAULT_Z,
            min_games: self.min_games.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BuildsResponse {
    pub builds: Vec<RankedBuild>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct BestBuildResponse {
    pub build: RankedBuild,
    /// Builds that matched the filter and were ranked.
    pub candidates: usize,
}

fn ranked_for(state: &AppState, params: &BuildsParams) -> Result<Vec<RankedBuild>, ApiError> {
    let builds = load_meta_builds(&state.storage)?;
    let matching = ranking::filter_builds(&builds, &params.filter());
    Ok(ranking::rank_builds(matching, &params.options()))
}

pub async fn list_builds(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BuildsParams>,
) -> Result<(CachePolicy, Json<BuildsResponse>), ApiError> {
    let ranked = ranked_for(&state, &params)?;
    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, ranked.len() as u32);

    Ok((
        BUILDS_CACHE,
        Json(BuildsResponse {
            builds: pagination.apply(ranked),
            pagination: meta,
        }),
    ))
}

pub async fn best_build(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BuildsParams>,
) -> Result<(CachePolicy, Json<BestBuildResponse>), ApiError> {
    let ranked = ranked_for(&state, &params)?;
    let candidates = ranked.len();
    let build = ranked
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("no builds match the filter".to_string()))?;

    Ok((BUILDS_CACHE, Json(BestBuildResponse { build, candidates })))
}
