//! Old School RuneScape player and monster data.

use serde::{Deserialize, Serialize};

/// Skills in hiscores order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Overall,
    Attack,
    Defence,
    Strength,
    Hitpoints,
    Ranged,
    Prayer,
    Magic,
    Cooking,
    Woodcutting,
    Fletching,
    Fishing,
    Firemaking,
    Crafting,
    Smithing,
    Mining,
    Herblore,
    Agility,
    Thieving,
    Slayer,
    Farming,
    Runecraft,
    Hunter,
    Construction,
}

impl Skill {
    pub const ALL: [Skill; 24] = [
        Skill::Overall,
        Skill::Attack,
        Skill::Defence,
        Skill::Strength,
        Skill::Hitpoints,
        Skill::Ranged,
        Skill::Prayer,
        Skill::Magic,
        Skill::Cooking,
        Skill::Woodcutting,
        Skill::Fletching,
        Skill::Fishing,
        Skill::Firemaking,
        Skill::Crafting,
        Skill::Smithing,
        Skill::Mining,
        Skill::Herblore,
        Skill::Agility,
        Skill::Thieving,
        Skill::Slayer,
        Skill::Farming,
        Skill::Runecraft,
        Skill::Hunter,
        Skill::Construction,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub skill: Skill,
    /// `None` when the player is unranked in this skill.
    pub rank: Option<u32>,
    pub level: u32,
    pub xp: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hiscores {
    pub player: String,
    pub skills: Vec<SkillEntry>,
}

impl Hiscores {
    pub fn level(&self, skill: Skill) -> Option<u32> {
        self.skills
            .iter()
            .find(|entry| entry.skill == skill)
            .map(|entry| entry.level)
    }

    /// Combat level from the standard formula.
    pub fn combat_level(&self) -> Option<u32> {
        let attack = self.level(Skill::Attack)? as f64;
        let strength = self.level(Skill::Strength)? as f64;
        let defence = self.level(Skill::Defence)? as f64;
        let hitpoints = self.level(Skill::Hitpoints)? as f64;
        let prayer = self.level(Skill::Prayer)? as f64;
        let ranged = self.level(Skill::Ranged)? as f64;
        let magic = self.level(Skill::Magic)? as f64;

        let base = 0.25 * (defence + hitpoints + (prayer / 2.0).floor());
        let melee = 0.325 * (attack + strength);
        let range = 0.325 * (ranged * 1.5).floor();
        let mage = 0.325 * (magic * 1.5).floor();
        Some((base + melee.max(range).max(mage)).floor() as u32)
    }
}

/// Melee attack type, selecting which defence bonus applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStyle {
    Stab,
    #[default]
    Slash,
    Crush,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub hitpoints: u32,
    pub defence_level: u32,
    #[serde(default)]
    pub stab_defence: i32,
    #[serde(default)]
    pub slash_defence: i32,
    #[serde(default)]
    pub crush_defence: i32,
}

impl Monster {
    pub fn defence_bonus(&self, style: AttackStyle) -> i32 {
        match style {
            AttackStyle::Stab => self.stab_defence,
            AttackStyle::Slash => self.slash_defence,
            AttackStyle::Crush => self.crush_defence,
        }
    }
}
