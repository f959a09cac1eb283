//! Old School RuneScape melee DPS.
//!
//! Accuracy compares an attack roll against a defence roll; damage is
//! uniform between zero and the max hit.

use serde::{Deserialize, Serialize};

use super::{clamp_f64, hits_to_kill, ttk_seconds};
use crate::models::{AttackStyle, Hiscores, Monster, Skill};

/// Length of one game tick in seconds.
pub const TICK_SECONDS: f64 = 0.6;

/// Combat stance, granting invisible level boosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Accurate,
    #[default]
    Aggressive,
    Controlled,
    Defensive,
}

impl Stance {
    pub fn attack_bonus(&self) -> u32 {
        match self {
            Stance::Accurate => 3,
            Stance::Controlled => 1,
            Stance::Aggressive | Stance::Defensive => 0,
        }
    }

    pub fn strength_bonus(&self) -> u32 {
        match self {
            Stance::Aggressive => 3,
            Stance::Controlled => 1,
            Stance::Accurate | Stance::Defensive => 0,
        }
    }
}

/// `floor(level * prayer) + stance + 8`
pub fn effective_level(level: u32, prayer_multiplier: f64, stance_bonus: u32) -> u32 {
    (level as f64 * prayer_multiplier).floor() as u32 + stance_bonus + 8
}

pub fn max_hit(effective_strength: u32, strength_bonus: i32) -> u32 {
    let product = effective_strength as i64 * (strength_bonus as i64 + 64) + 320;
    (product.max(0) / 640) as u32
}

pub fn attack_roll(effective_attack: u32, attack_bonus: i32) -> i64 {
    effective_attack as i64 * (attack_bonus as i64 + 64)
}

pub fn defence_roll(defence_level: u32, defence_bonus: i32) -> i64 {
    (defence_level as i64 + 9) * (defence_bonus as i64 + 64)
}

/// Probability that an attack roll beats a defence roll.
pub fn hit_chance(attack_roll: i64, defence_roll: i64) -> f64 {
    if attack_roll <= 0 || defence_roll <= 0 {
        return 0.0;
    }
    let atk = attack_roll as f64;
    let def = defence_roll as f64;
    let chance = if atk > def {
        1.0 - (def + 2.0) / (2.0 * (atk + 1.0))
    } else {
        atk / (2.0 * (def + 1.0))
    };
    chance.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsrsMeleeInput {
    pub attack_level: u32,
    pub strength_level: u32,
    pub attack_bonus: i32,
    pub strength_bonus: i32,
    pub stance: Stance,
    pub attack_prayer: f64,
    pub strength_prayer: f64,
    pub speed_ticks: u32,
    pub target_defence_level: u32,
    pub target_defence_bonus: i32,
    pub target_hp: u32,
}

impl Default for OsrsMeleeInput {
    fn default() -> Self {
        Self {
            attack_level: 75,
            strength_level: 75,
            attack_bonus: 0,
            strength_bonus: 0,
            stance: Stance::default(),
            attack_prayer: 1.0,
            strength_prayer: 1.0,
            speed_ticks: 4,
            target_defence_level: 1,
            target_defence_bonus: 0,
            target_hp: 100,
        }
    }
}

impl OsrsMeleeInput {
    /// Take the target's stats from a monster.
    pub fn against(mut self, monster: &Monster, style: AttackStyle) -> Self {
        self.target_defence_level = monster.defence_level;
        self.target_defence_bonus = monster.defence_bonus(style);
        self.target_hp = monster.hitpoints;
        self
    }

    /// Take attack and strength levels from a hiscores lookup.
    pub fn with_hiscores(mut self, hiscores: &Hiscores) -> Self {
        if let Some(level) = hiscores.level(Skill::Attack) {
            self.attack_level = level;
        }
        if let Some(level) = hiscores.level(Skill::Strength) {
            self.strength_level = level;
        }
        self
    }

    fn clamped(&self) -> Self {
        Self {
            attack_level: self.attack_level.clamp(1, 99),
            strength_level: self.strength_level.clamp(1, 99),
            attack_bonus: self.attack_bonus.clamp(-64, 500),
            strength_bonus: self.strength_bonus.clamp(-64, 500),
            stance: self.stance,
            attack_prayer: clamp_f64(self.attack_prayer, 1.0, 1.25),
            strength_prayer: clamp_f64(self.strength_prayer, 1.0, 1.25),
            speed_ticks: self.speed_ticks.clamp(1, 10),
            target_defence_level: self.target_defence_level.clamp(1, 500),
            target_defence_bonus: self.target_defence_bonus.clamp(-64, 1000),
            target_hp: self.target_hp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OsrsDpsResult {
    pub effective_attack: u32,
    pub effective_strength: u32,
    pub max_hit: u32,
    pub attack_roll: i64,
    pub defence_roll: i64,
    pub hit_chance: f64,
    pub expected_hit: f64,
    pub attack_interval_seconds: f64,
    pub dps: f64,
    pub ttk_seconds: Option<f64>,
    pub expected_hits_to_kill: Option<u32>,
}

pub fn compute_osrs_dps(input: &OsrsMeleeInput) -> OsrsDpsResult {
    let input = input.clamped();

    let effective_attack = effective_level(
        input.attack_level,
        input.attack_prayer,
        input.stance.attack_bonus(),
    );
    let effective_strength = effective_level(
        input.strength_level,
        input.strength_prayer,
        input.stance.strength_bonus(),
    );

    let max_hit = max_hit(effective_strength, input.strength_bonus);
    let attack_roll = attack_roll(effective_attack, input.attack_bonus);
    let defence_roll = defence_roll(input.target_defence_level, input.target_defence_bonus);
    let hit_chance = hit_chance(attack_roll, defence_roll);

    let expected_hit = hit_chance * max_hit as f64 / 2.0;
    let attack_interval_seconds = input.speed_ticks as f64 * TICK_SECONDS;
    let dps = expected_hit / attack_interval_seconds;
    let target_hp = input.target_hp as f64;

    OsrsDpsResult {
        effective_attack,
        effective_strength,
        max_hit,
        attack_roll,
        defence_roll,
        hit_chance,
        expected_hit,
        attack_interval_seconds,
        dps,
        ttk_seconds: ttk_seconds(target_hp, dps),
        expected_hits_to_kill: hits_to_kill(target_hp, expected_hit),
    }
}
