//! Fortnite time-to-eliminate.

use serde::{Deserialize, Serialize};

use super::{clamp_f64, hits_to_kill};

pub const MAX_HEALTH: f64 = 100.0;
pub const MAX_SHIELD: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FortniteInput {
    /// Damage per pellet (per bullet for non-shotguns).
    pub body_damage: f64,
    pub headshot_multiplier: f64,
    pub headshot: bool,
    pub pellets_hit: u32,
    /// Shots per second.
    pub fire_rate: f64,
    pub magazine_size: u32,
    pub reload_seconds: f64,
    pub target_health: f64,
    pub target_shield: f64,
}

impl Default for FortniteInput {
    fn default() -> Self {
        Self {
            body_damage: 30.0,
            headshot_multiplier: 1.5,
            headshot: false,
            pellets_hit: 1,
            fire_rate: 5.0,
            magazine_size: 30,
            reload_seconds: 2.3,
            target_health: MAX_HEALTH,
            target_shield: MAX_SHIELD,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FortniteTtkResult {
    pub damage_per_shot: f64,
    pub effective_hp: f64,
    pub shots_to_eliminate: Option<u32>,
    pub burst_dps: f64,
    pub sustained_dps: f64,
    pub magazines_needed: Option<u32>,
    /// Elimination takes more than one magazine.
    pub needs_reload: bool,
    pub ttk_seconds: Option<f64>,
}

pub fn compute_fortnite_ttk(input: &FortniteInput) -> FortniteTtkResult {
    let health = clamp_f64(input.target_health, 0.0, MAX_HEALTH);
    let shield = clamp_f64(input.target_shield, 0.0, MAX_SHIELD);
    let effective_hp = health + shield;

    let multiplier = if input.headshot {
        input.headshot_multiplier.max(1.0)
    } else {
        1.0
    };
    let damage_per_shot = input.body_damage.max(0.0) * input.pellets_hit as f64 * multiplier;
    let fire_rate = if input.fire_rate.is_finite() {
        input.fire_rate.max(0.0)
    } else {
        0.0
    };
    let reload = input.reload_seconds.max(0.0);

    let burst_dps = damage_per_shot * fire_rate;
    let sustained_dps = if input.magazine_size == 0 || fire_rate <= 0.0 {
        burst_dps
    } else {
        let mag = input.magazine_size as f64;
        mag * damage_per_shot / (mag / fire_rate + reload)
    };

    let shots_to_eliminate = hits_to_kill(effective_hp, damage_per_shot);
    let magazines_needed = match (shots_to_eliminate, input.magazine_size) {
        (Some(stk), mag) if mag > 0 => Some(stk.div_ceil(mag).max(1)),
        _ => None,
    };

    let ttk_seconds = match shots_to_eliminate {
        Some(stk) if fire_rate > 0.0 => {
            let reloads = magazines_needed.map(|m| m.saturating_sub(1)).unwrap_or(0);
            Some(stk.saturating_sub(1) as f64 / fire_rate + reloads as f64 * reload)
        }
        _ => None,
    };

    FortniteTtkResult {
        damage_per_shot,
        effective_hp,
        shots_to_eliminate,
        burst_dps,
        sustained_dps,
        magazines_needed,
        needs_reload: magazines_needed.is_some_and(|m| m > 1),
        ttk_seconds,
    }
}
