use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, ApiPath, ApiQuery, CachePolicy};
use crate::models::{ChampionSummary, SummonerProfile};
use crate::sources::riot::{Platform, RiotId};

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
}

pub async fn latest_version(
    State(state): State<AppState>,
) -> Result<(CachePolicy, Json<VersionResponse>), ApiError> {
    let version = state.ddragon.latest_version().await?;
    Ok((CachePolicy::public(3600), Json(VersionResponse { version })))
}

#[derive(Debug, Deserialize)]
pub struct ChampionsParams {
    pub patch: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChampionsResponse {
    pub version: String,
    pub champions: Vec<ChampionSummary>,
}

pub async fn champions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ChampionsParams>,
) -> Result<(CachePolicy, Json<ChampionsResponse>), ApiError> {
    let version = match params.patch.filter(|p| !p.trim().is_empty()) {
        Some(patch) => patch,
        None => state.ddragon.latest_version().await?,
    };
    let champions = state.ddragon.champions(&version).await?;
    Ok((
        CachePolicy::public(3600),
        Json(ChampionsResponse { version, champions }),
    ))
}

pub async fn profile(
    State(state): State<AppState>,
    ApiPath((platform, riot_id)): ApiPath<(String, String)>,
) -> Result<(CachePolicy, Json<SummonerProfile>), ApiError> {
    let platform: Platform = platform.parse()?;
    let riot_id = RiotId::parse(&riot_id)?;
    let client = state.riot()?;

    let profile = client
        .lookup_profile(&riot_id, platform, state.config.riot.match_count)
        .await?;
    Ok((CachePolicy::public(120), Json(profile)))
}
