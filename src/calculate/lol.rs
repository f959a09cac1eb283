//! League of Legends damage math.
//!
//! Armor and magic resist share one curve: each point of positive resist
//! adds 1% effective health, negative resist amplifies damage
//! asymptotically towards 2x.

use serde::{Deserialize, Serialize};

use super::{clamp_f64, hits_to_kill, ttk_seconds};

/// Attack speed cap for champions without cap-lifting effects.
pub const ATTACK_SPEED_CAP: f64 = 2.5;

/// Base critical strike damage (175%).
pub const DEFAULT_CRIT_DAMAGE: f64 = 1.75;

/// Damage multiplier applied by a resist value.
pub fn damage_multiplier(resist: f64) -> f64 {
    if resist >= 0.0 {
        100.0 / (100.0 + resist)
    } else {
        2.0 - 100.0 / (100.0 - resist)
    }
}

/// Resist shred and penetration applied by the attacker.
///
/// Percentages are fractions (`0.35` for 35%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penetration {
    pub flat_reduction: f64,
    pub percent_reduction: f64,
    pub percent_pen: f64,
    /// Flat penetration (lethality for armor).
    pub flat_pen: f64,
}

/// Resist after reduction and penetration, in game order.
///
/// Flat reduction may push resist negative; percent effects only touch
/// positive resist and flat penetration stops at zero.
pub fn effective_resist(resist: f64, pen: &Penetration) -> f64 {
    let mut r = resist - pen.flat_reduction.max(0.0);
    if r > 0.0 {
        r *= 1.0 - clamp_f64(pen.percent_reduction, 0.0, 1.0);
    }
    if r > 0.0 {
        r *= 1.0 - clamp_f64(pen.percent_pen, 0.0, 1.0);
    }
    if r > 0.0 {
        r = (r - pen.flat_pen.max(0.0)).max(0.0);
    }
    r
}

/// Raw damage needed to remove `hp` through `resist`.
pub fn effective_hp(hp: f64, resist: f64) -> f64 {
    hp / damage_multiplier(resist)
}

/// Share of incoming damage by type. Normalised before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageSplit {
    pub physical: f64,
    pub magic: f64,
    pub true_damage: f64,
}

impl DamageSplit {
    fn normalized(&self) -> (f64, f64, f64) {
        let p = self.physical.max(0.0);
        let m = self.magic.max(0.0);
        let t = self.true_damage.max(0.0);
        let total = p + m + t;
        if total <= 0.0 {
            (1.0, 0.0, 0.0)
        } else {
            (p / total, m / total, t / total)
        }
    }
}

/// Effective health against a blend of damage types.
pub fn mixed_effective_hp(hp: f64, armor: f64, magic_resist: f64, split: &DamageSplit) -> f64 {
    let (p, m, t) = split.normalized();
    let blended = p * damage_multiplier(armor) + m * damage_multiplier(magic_resist) + t;
    hp / blended
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveHpResult {
    pub physical_ehp: f64,
    pub magic_ehp: f64,
    pub mixed_ehp: f64,
    pub armor_damage_reduction: f64,
    pub magic_damage_reduction: f64,
}

pub fn compute_effective_hp(
    hp: f64,
    armor: f64,
    magic_resist: f64,
    split: &DamageSplit,
) -> EffectiveHpResult {
    let hp = hp.max(0.0);
    EffectiveHpResult {
        physical_ehp: effective_hp(hp, armor),
        magic_ehp: effective_hp(hp, magic_resist),
        mixed_ehp: mixed_effective_hp(hp, armor, magic_resist, split),
        armor_damage_reduction: 1.0 - damage_multiplier(armor),
        magic_damage_reduction: 1.0 - damage_multiplier(magic_resist),
    }
}

/// Average damage multiplier of an attack that may crit.
pub fn expected_crit_multiplier(crit_chance: f64, crit_damage: f64) -> f64 {
    1.0 + clamp_f64(crit_chance, 0.0, 1.0) * (crit_damage.max(1.0) - 1.0)
}

/// Inputs for sustained auto-attack damage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoAttackInput {
    pub attack_damage: f64,
    pub attack_speed: f64,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub on_hit_physical: f64,
    pub on_hit_magic: f64,
    pub target_hp: f64,
    pub target_armor: f64,
    pub target_magic_resist: f64,
    pub armor_pen: Penetration,
    pub magic_pen: Penetration,
}

impl Default for AutoAttackInput {
    fn default() -> Self {
        Self {
            attack_damage: 100.0,
            attack_speed: 1.0,
            crit_chance: 0.0,
            crit_damage: DEFAULT_CRIT_DAMAGE,
            on_hit_physical: 0.0,
            on_hit_magic: 0.0,
            target_hp: 2000.0,
            target_armor: 100.0,
            target_magic_resist: 50.0,
            armor_pen: Penetration::default(),
            magic_pen: Penetration::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoAttackResult {
    pub attack_speed: f64,
    pub crit_multiplier: f64,
    pub pre_mitigation_per_hit: f64,
    pub post_mitigation_per_hit: f64,
    pub effective_armor: f64,
    pub effective_magic_resist: f64,
    pub dps: f64,
    pub ttk_seconds: Option<f64>,
    pub autos_to_kill: Option<u32>,
}

/// Auto-attack DPS against a single target.
pub fn auto_attack_dps(input: &AutoAttackInput) -> AutoAttackResult {
    let attack_speed = clamp_f64(input.attack_speed, 0.0, ATTACK_SPEED_CAP);
    let crit_multiplier = expected_crit_multiplier(input.crit_chance, input.crit_damage);

    let physical = input.attack_damage.max(0.0) * crit_multiplier + input.on_hit_physical.max(0.0);
    let magic = input.on_hit_magic.max(0.0);

    let effective_armor = effective_resist(input.target_armor, &input.armor_pen);
    let effective_magic_resist = effective_resist(input.target_magic_resist, &input.magic_pen);

    let post = physical * damage_multiplier(effective_armor) + magic * damage_multiplier(effective_magic_resist);
    let dps = post * attack_speed;
    let target_hp = input.target_hp.max(0.0);

    AutoAttackResult {
        attack_speed,
        crit_multiplier,
        pre_mitigation_per_hit: physical + magic,
        post_mitigation_per_hit: post,
        effective_armor,
        effective_magic_resist,
        dps,
        ttk_seconds: ttk_seconds(target_hp, dps),
        autos_to_kill: hits_to_kill(target_hp, post),
    }
}

/// A burst combo checked against a target's current health.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KillCheckInput {
    pub target_hp: f64,
    pub target_armor: f64,
    pub target_magic_resist: f64,
    pub physical: f64,
    pub magic: f64,
    pub true_damage: f64,
    pub armor_pen: Penetration,
    pub magic_pen: Penetration,
    /// Pre-mitigation physical damage of one follow-up auto attack.
    pub follow_up_auto: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KillCheckResult {
    pub physical_after_mitigation: f64,
    pub magic_after_mitigation: f64,
    pub total_damage: f64,
    pub remaining_hp: f64,
    pub overkill: f64,
    pub killable: bool,
    pub hp_fraction_dealt: f64,
    pub follow_up_autos: Option<u32>,
}

pub fn kill_check(input: &KillCheckInput) -> KillCheckResult {
    let armor = effective_resist(input.target_armor, &input.armor_pen);
    let mr = effective_resist(input.target_magic_resist, &input.magic_pen);

    let physical = input.physical.max(0.0) * damage_multiplier(armor);
    let magic = input.magic.max(0.0) * damage_multiplier(mr);
    let total = physical + magic + input.true_damage.max(0.0);

    let hp = input.target_hp.max(0.0);
    let killable = total >= hp;
    let remaining_hp = (hp - total).max(0.0);
    let hp_fraction_dealt = if hp > 0.0 { (total / hp).min(1.0) } else { 1.0 };

    let follow_up_autos = if killable {
        Some(0)
    } else {
        input
            .follow_up_auto
            .and_then(|auto| hits_to_kill(remaining_hp, auto.max(0.0) * damage_multiplier(armor)))
    };

    KillCheckResult {
        physical_after_mitigation: physical,
        magic_after_mitigation: magic,
        total_damage: total,
        remaining_hp,
        overkill: (total - hp).max(0.0),
        killable,
        hp_fraction_dealt,
        follow_up_autos,
    }
}
