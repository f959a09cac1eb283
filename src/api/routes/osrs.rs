use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::{ApiError, ApiPath, CachePolicy};
use crate::models::{Hiscores, Monster};
use crate::storage::load_monsters;

#[derive(Debug, Serialize)]
pub struct MonstersResponse {
    pub monsters: Vec<Monster>,
}

pub async fn list_monsters(
    State(state): State<AppState>,
) -> Result<(CachePolicy, Json<MonstersResponse>), ApiError> {
    let mut monsters = load_monsters(&state.storage)?;
    monsters.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok((CachePolicy::public(3600), Json(MonstersResponse { monsters })))
}

#[derive(Debug, Serialize)]
pub struct HiscoresResponse {
    #[serde(flatten)]
    pub hiscores: Hiscores,
    pub combat_level: Option<u32>,
}

pub async fn hiscores(
    State(state): State<AppState>,
    ApiPath(player): ApiPath<String>,
) -> Result<(CachePolicy, Json<HiscoresResponse>), ApiError> {
    let hiscores = state.hiscores.lookup(&player).await?;
    let combat_level = hiscores.combat_level();
    Ok((
        CachePolicy::public(300),
        Json(HiscoresResponse {
            hiscores,
            combat_level,
        }),
    ))
}
