//! Calculation engine.
//!
//! Stateless damage formulas, one module per game:
//! - League of Legends resist math, crit blending, DPS and kill checks
//! - Old School RuneScape melee accuracy and max hit
//! - Call of Duty and Fortnite shots-to-kill and time-to-kill
//! - Wilson lower bound ranking for meta builds

pub mod cod;
pub mod fortnite;
pub mod lol;
pub mod osrs;
pub mod ranking;

/// Time to kill in seconds: `hp / dps`.
///
/// Returns `None` when the damage rate cannot kill anything (zero, negative or
/// non-finite) or when `hp` is negative.
pub fn ttk_seconds(hp: f64, dps: f64) -> Option<f64> {
    if !hp.is_finite() || hp < 0.0 || !dps.is_finite() || dps <= 0.0 {
        return None;
    }
    Some(hp / dps)
}

/// Number of hits needed to bring `hp` to zero.
pub fn hits_to_kill(hp: f64, damage_per_hit: f64) -> Option<u32> {
    if !damage_per_hit.is_finite() || damage_per_hit <= 0.0 || !hp.is_finite() {
        return None;
    }
    if hp <= 0.0 {
        return Some(0);
    }
    Some((hp / damage_per_hit).ceil() as u32)
}

/// Clamp a float into `[min, max]`, mapping NaN to `min`.
pub(crate) fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
