//! Call of Duty time-to-kill.

use serde::{Deserialize, Serialize};

use super::hits_to_kill;

pub const BASE_HEALTH: f64 = 100.0;
pub const ARMOR_PLATE_HEALTH: f64 = 50.0;
pub const MAX_ARMOR_PLATES: u32 = 3;

/// Damage out to `max_range_m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRange {
    pub max_range_m: f64,
    pub damage: f64,
}

/// Range brackets ordered by distance. The last bracket also covers
/// everything past its range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageProfile {
    pub brackets: Vec<DamageRange>,
}

impl DamageProfile {
    pub fn new(mut brackets: Vec<DamageRange>) -> Self {
        brackets.sort_by(|a, b| a.max_range_m.total_cmp(&b.max_range_m));
        Self { brackets }
    }

    /// Single damage value at every range.
    pub fn flat(damage: f64) -> Self {
        Self::new(vec![DamageRange {
            max_range_m: f64::INFINITY,
            damage,
        }])
    }

    pub fn damage_at(&self, range_m: f64) -> f64 {
        self.brackets
            .iter()
            .find(|b| range_m <= b.max_range_m)
            .or_else(|| self.brackets.last())
            .map(|b| b.damage)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitZone {
    Head,
    #[default]
    UpperTorso,
    LowerTorso,
    Limbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitMultipliers {
    pub head: f64,
    pub upper_torso: f64,
    pub lower_torso: f64,
    pub limbs: f64,
}

impl Default for HitMultipliers {
    fn default() -> Self {
        Self {
            head: 1.0,
            upper_torso: 1.0,
            lower_torso: 1.0,
            limbs: 1.0,
        }
    }
}

impl HitMultipliers {
    pub fn for_zone(&self, zone: HitZone) -> f64 {
        match zone {
            HitZone::Head => self.head,
            HitZone::UpperTorso => self.upper_torso,
            HitZone::LowerTorso => self.lower_torso,
            HitZone::Limbs => self.limbs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodInput {
    pub profile: DamageProfile,
    pub multipliers: HitMultipliers,
    pub zone: HitZone,
    pub range_m: f64,
    pub rpm: f64,
    pub armor_plates: u32,
    /// Delay before the first shot lands (ADS, sprint-to-fire).
    pub open_delay_ms: f64,
}

impl Default for CodInput {
    fn default() -> Self {
        Self {
            profile: DamageProfile::flat(30.0),
            multipliers: HitMultipliers::default(),
            zone: HitZone::default(),
            range_m: 10.0,
            rpm: 750.0,
            armor_plates: 0,
            open_delay_ms: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CodTtkResult {
    pub target_health: f64,
    pub damage_per_shot: f64,
    pub shots_to_kill: Option<u32>,
    pub ms_between_shots: Option<f64>,
    pub ttk_ms: Option<f64>,
    pub dps: f64,
}

pub fn compute_cod_ttk(input: &CodInput) -> CodTtkResult {
    let plates = input.armor_plates.min(MAX_ARMOR_PLATES);
    let target_health = BASE_HEALTH + plates as f64 * ARMOR_PLATE_HEALTH;

    let damage_per_shot = (input.profile.damage_at(input.range_m.max(0.0))
        * input.multipliers.for_zone(input.zone))
    .max(0.0);
    let rpm = if input.rpm.is_finite() { input.rpm.max(0.0) } else { 0.0 };

    let shots_to_kill = hits_to_kill(target_health, damage_per_shot);
    let ms_between_shots = (rpm > 0.0).then(|| 60_000.0 / rpm);
    let ttk_ms = match (shots_to_kill, ms_between_shots) {
        (Some(stk), Some(gap)) => {
            Some(stk.saturating_sub(1) as f64 * gap + input.open_delay_ms.max(0.0))
        }
        _ => None,
    };

    CodTtkResult {
        target_health,
        damage_per_shot,
        shots_to_kill,
        ms_between_shots,
        ttk_ms,
        dps: damage_per_shot * rpm / 60.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn falloff_profile() -> DamageProfile {
        DamageProfile::new(vec![
            DamageRange {
                max_range_m: 40.0,
                damage: 24.0,
            },
            DamageRange {
                max_range_m: 20.0,
                damage: 30.0,
            },
        ])
    }

    #[test]
    fn test_damage_at_brackets() {
        let profile = falloff_profile();
        assert_eq!(profile.damage_at(5.0), 30.0);
        assert_eq!(profile.damage_at(20.0), 30.0);
        assert_eq!(profile.damage_at(25.0), 24.0);
        // past the last bracket
        assert_eq!(profile.damage_at(90.0), 24.0);
        assert_eq!(DamageProfile::default().damage_at(10.0), 0.0);
    }

    #[test]
    fn test_compute_cod_ttk() {
        let input = CodInput {
            profile: falloff_profile(),
            range_m: 25.0,
            rpm: 750.0,
            ..Default::default()
        };
        let result = compute_cod_ttk(&input);

        assert_eq!(result.damage_per_shot, 24.0);
        assert_eq!(result.shots_to_kill, Some(5));
        assert_eq!(result.ms_between_shots, Some(80.0));
        assert_eq!(result.ttk_ms, Some(320.0));
        assert_eq!(result.dps, 300.0);
    }

    #[test]
    fn test_headshot_multiplier() {
        let input = CodInput {
            profile: falloff_profile(),
            multipliers: HitMultipliers {
                head: 1.5,
                ..Default::default()
            },
            zone: HitZone::Head,
            range_m: 10.0,
            rpm: 750.0,
            open_delay_ms: 100.0,
            ..Default::default()
        };
        let result = compute_cod_ttk(&input);

        assert_eq!(result.damage_per_shot, 45.0);
        assert_eq!(result.shots_to_kill, Some(3));
        assert_eq!(result.ttk_ms, Some(260.0));
    }

    #[test]
    fn test_armor_plates_never_reduce_shots() {
        let mut previous = 0;
        for plates in 0..=5 {
            let input = CodInput {
                armor_plates: plates,
                ..Default::default()
            };
            let stk = compute_cod_ttk(&input).shots_to_kill.unwrap();
            assert!(stk >= previous);
            previous = stk;
        }
        // plates beyond the cap are ignored
        let capped = compute_cod_ttk(&CodInput {
            armor_plates: 9,
            ..Default::default()
        });
        assert_eq!(capped.target_health, 250.0);
    }

    #[test]
    fn test_zero_rpm_has_no_ttk() {
        let input = CodInput {
            rpm: 0.0,
            ..Default::default()
        };
        let result = compute_cod_ttk(&input);
        assert_eq!(result.shots_to_kill, Some(4));
        assert!(result.ttk_ms.is_none());
        assert_eq!(result.dps, 0.0);
    }
}
