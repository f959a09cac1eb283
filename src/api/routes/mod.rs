pub mod builds;
pub mod calc;
pub mod lol;
pub mod osrs;
pub mod wow;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::CachePolicy;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub riot_configured: bool,
    pub blizzard_configured: bool,
}

pub async fn health(State(state): State<AppState>) -> (CachePolicy, Json<HealthResponse>) {
    (
        CachePolicy::NoStore,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            riot_configured: state.riot.is_some(),
            blizzard_configured: state.blizzard.is_some(),
        }),
    )
}
