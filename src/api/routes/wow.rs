use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::CachePolicy;
use crate::fetch::soft_fail;
use crate::models::Realm;

#[derive(Debug, Serialize)]
pub struct RealmsResponse {
    pub region: String,
    /// False when the realm list could not be fetched.
    pub available: bool,
    pub realms: Vec<Realm>,
}

/// Realm list for the configured region. Never fails; an unavailable
/// upstream yields an empty list that is not cached.
pub async fn realms(State(state): State<AppState>) -> (CachePolicy, Json<RealmsResponse>) {
    let (region, result) = match state.blizzard() {
        Ok(client) => (client.region().to_string(), client.realms().await),
        Err(e) => (state.config.blizzard.region.clone(), Err(e)),
    };
    let available = result.is_ok();
    let realms = soft_fail(result, Vec::new(), "WoW realm list");

    let policy = if available {
        CachePolicy::public(3600)
    } else {
        CachePolicy::NoStore
    };
    (
        policy,
        Json(RealmsResponse {
            region,
            available,
            realms,
        }),
    )
}
