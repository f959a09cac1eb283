//! Calculator endpoints.
//!
//! Every input travels in the query string so a calculator state can be
//! bookmarked or shared. Missing parameters fall back to the calculator
//! defaults. Responses are never cached.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{ApiError, ApiQuery, CachePolicy};
use crate::calculate::cod::{
    compute_cod_ttk, CodInput, CodTtkResult, DamageProfile, DamageRange, HitMultipliers, HitZone,
};
use crate::calculate::fortnite::{compute_fortnite_ttk, FortniteInput, FortniteTtkResult};
use crate::calculate::lol::{
    auto_attack_dps, compute_effective_hp, kill_check, AutoAttackInput, AutoAttackResult,
    DamageSplit, EffectiveHpResult, KillCheckInput, KillCheckResult, Penetration,
};
use crate::calculate::osrs::{compute_osrs_dps, OsrsDpsResult, OsrsMeleeInput, Stance};
use crate::models::AttackStyle;
use crate::storage::{find_monster, load_monsters};

type CalcResponse<T> = Result<(CachePolicy, Json<T>), ApiError>;

fn no_store<T>(result: T) -> CalcResponse<T> {
    Ok((CachePolicy::NoStore, Json(result)))
}

/// Penetration and shred, percentages as fractions.
#[derive(Debug, Default)]
pub struct PenetrationParams {
    pub lethality: Option<f64>,
    pub armor_pen_percent: Option<f64>,
    pub armor_reduction_flat: Option<f64>,
    pub armor_reduction_percent: Option<f64>,
    pub magic_pen_flat: Option<f64>,
    pub magic_pen_percent: Option<f64>,
    pub mr_reduction_flat: Option<f64>,
    pub mr_reduction_percent: Option<f64>,
}

impl PenetrationParams {
    fn armor(&self) -> Penetration {
        Penetration {
            flat_reduction: self.armor_reduction_flat.unwrap_or(0.0),
            percent_reduction: self.armor_reduction_percent.unwrap_or(0.0),
            percent_pen: self.armor_pen_percent.unwrap_or(0.0),
            flat_pen: self.lethality.unwrap_or(0.0),
        }
    }

    fn magic(&self) -> Penetration {
        Penetration {
            flat_reduction: self.mr_reduction_flat.unwrap_or(0.0),
            percent_reduction: self.mr_reduction_percent.unwrap_or(0.0),
            percent_pen: self.magic_pen_percent.unwrap_or(0.0),
            flat_pen: self.magic_pen_flat.unwrap_or(0.0),
        }
    }
}

// serde_urlencoded cannot flatten numeric fields, so each endpoint lists
// its penetration parameters explicitly and hands them to PenetrationParams.
macro_rules! penetration_params {
    ($params:expr) => {
        PenetrationParams {
            lethality: $params.lethality,
            armor_pen_percent: $params.armor_pen_percent,
            armor_reduction_flat: $params.armor_reduction_flat,
            armor_reduction_percent: $params.armor_reduction_percent,
            magic_pen_flat: $params.magic_pen_flat,
            magic_pen_percent: $params.magic_pen_percent,
            mr_reduction_flat: $params.mr_reduction_flat,
            mr_reduction_percent: $params.mr_reduction_percent,
        }
    };
}

#[derive(Debug, Default, Deserialize)]
pub struct LolDpsParams {
    pub attack_damage: Option<f64>,
    pub attack_speed: Option<f64>,
    pub crit_chance: Option<f64>,
    pub crit_damage: Option<f64>,
    pub on_hit_physical: Option<f64>,
    pub on_hit_magic: Option<f64>,
    pub target_hp: Option<f64>,
    pub target_armor: Option<f64>,
    pub target_magic_resist: Option<f64>,
    pub lethality: Option<f64>,
    pub armor_pen_percent: Option<f64>,
    pub armor_reduction_flat: Option<f64>,
    pub armor_reduction_percent: Option<f64>,
    pub magic_pen_flat: Option<f64>,
    pub magic_pen_percent: Option<f64>,
    pub mr_reduction_flat: Option<f64>,
    pub mr_reduction_percent: Option<f64>,
}

impl From<LolDpsParams> for AutoAttackInput {
    fn from(params: LolDpsParams) -> Self {
        let pen = penetration_params!(params);
        let d = AutoAttackInput::default();
        AutoAttackInput {
            attack_damage: params.attack_damage.unwrap_or(d.attack_damage),
            attack_speed: params.attack_speed.unwrap_or(d.attack_speed),
            crit_chance: params.crit_chance.unwrap_or(d.crit_chance),
            crit_damage: params.crit_damage.unwrap_or(d.crit_damage),
            on_hit_physical: params.on_hit_physical.unwrap_or(d.on_hit_physical),
            on_hit_magic: params.on_hit_magic.unwrap_or(d.on_hit_magic),
            target_hp: params.target_hp.unwrap_or(d.target_hp),
            target_armor: params.target_armor.unwrap_or(d.target_armor),
            target_magic_resist: params.target_magic_resist.unwrap_or(d.target_magic_resist),
            armor_pen: pen.armor(),
            magic_pen: pen.magic(),
        }
    }
}

pub async fn lol_dps(ApiQuery(params): ApiQuery<LolDpsParams>) -> CalcResponse<AutoAttackResult> {
    no_store(auto_attack_dps(&params.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct KillCheckParams {
    pub target_hp: Option<f64>,
    pub target_armor: Option<f64>,
    pub target_magic_resist: Option<f64>,
    pub physical: Option<f64>,
    pub magic: Option<f64>,
    pub true_damage: Option<f64>,
    pub follow_up_auto: Option<f64>,
    pub lethality: Option<f64>,
    pub armor_pen_percent: Option<f64>,
    pub armor_reduction_flat: Option<f64>,
    pub armor_reduction_percent: Option<f64>,
    pub magic_pen_flat: Option<f64>,
    pub magic_pen_percent: Option<f64>,
    pub mr_reduction_flat: Option<f64>,
    pub mr_reduction_percent: Option<f64>,
}

pub async fn lol_kill_check(
    ApiQuery(params): ApiQuery<KillCheckParams>,
) -> CalcResponse<KillCheckResult> {
    let target_hp = params
        .target_hp
        .ok_or_else(|| ApiError::BadRequest("target_hp is required".to_string()))?;
    let pen = penetration_params!(params);
    let input = KillCheckInput {
        target_hp,
        target_armor: params.target_armor.unwrap_or(0.0),
        target_magic_resist: params.target_magic_resist.unwrap_or(0.0),
        physical: params.physical.unwrap_or(0.0),
        magic: params.magic.unwrap_or(0.0),
        true_damage: params.true_damage.unwrap_or(0.0),
        armor_pen: pen.armor(),
        magic_pen: pen.magic(),
        follow_up_auto: params.follow_up_auto,
    };
    no_store(kill_check(&input))
}

#[derive(Debug, Deserialize)]
pub struct EhpParams {
    pub hp: f64,
    #[serde(default)]
    pub armor: f64,
    #[serde(default)]
    pub magic_resist: f64,
    pub physical_share: Option<f64>,
    pub magic_share: Option<f64>,
    pub true_share: Option<f64>,
}

pub async fn lol_ehp(ApiQuery(params): ApiQuery<EhpParams>) -> CalcResponse<EffectiveHpResult> {
    let split = DamageSplit {
        physical: params.physical_share.unwrap_or(1.0),
        magic: params.magic_share.unwrap_or(1.0),
        true_damage: params.true_share.unwrap_or(0.0),
    };
    no_store(compute_effective_hp(
        params.hp,
        params.armor,
        params.magic_resist,
        &split,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct OsrsDpsParams {
    pub attack_level: Option<u32>,
    pub strength_level: Option<u32>,
    pub attack_bonus: Option<i32>,
    pub strength_bonus: Option<i32>,
    pub stance: Option<Stance>,
    pub attack_prayer: Option<f64>,
    pub strength_prayer: Option<f64>,
    pub speed_ticks: Option<u32>,
    pub target_defence_level: Option<u32>,
    pub target_defence_bonus: Option<i32>,
    pub target_hp: Option<u32>,
    /// Monster fixture name; overrides the target fields.
    pub monster: Option<String>,
    pub style: Option<AttackStyle>,
    /// Take attack and strength levels from this player's hiscores.
    pub player: Option<String>,
}

pub async fn osrs_dps(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<OsrsDpsParams>,
) -> CalcResponse<OsrsDpsResult> {
    let d = OsrsMeleeInput::default();
    let mut input = OsrsMeleeInput {
        attack_level: params.attack_level.unwrap_or(d.attack_level),
        strength_level: params.strength_level.unwrap_or(d.strength_level),
        attack_bonus: params.attack_bonus.unwrap_or(d.attack_bonus),
        strength_bonus: params.strength_bonus.unwrap_or(d.strength_bonus),
        stance: params.stance.unwrap_or(d.stance),
        attack_prayer: params.attack_prayer.unwrap_or(d.attack_prayer),
        strength_prayer: params.strength_prayer.unwrap_or(d.strength_prayer),
        speed_ticks: params.speed_ticks.unwrap_or(d.speed_ticks),
        target_defence_level: params.target_defence_level.unwrap_or(d.target_defence_level),
        target_defence_bonus: params.target_defence_bonus.unwrap_or(d.target_defence_bonus),
        target_hp: params.target_hp.unwrap_or(d.target_hp),
    };

    if let Some(name) = params.monster.as_deref().filter(|n| !n.trim().is_empty()) {
        let monsters = load_monsters(&state.storage)?;
        let monster = find_monster(&monsters, name)
            .ok_or_else(|| ApiError::NotFound(format!("monster '{}'", name)))?;
        input = input.against(monster, params.style.unwrap_or_default());
    }

    if let Some(player) = params.player.as_deref().filter(|p| !p.trim().is_empty()) {
        let hiscores = state.hiscores.lookup(player).await?;
        input = input.with_hiscores(&hiscores);
    }

    no_store(compute_osrs_dps(&input))
}

#[derive(Debug, Default, Deserialize)]
pub struct CodParams {
    /// Flat damage per shot, used when `damage_ranges` is absent.
    pub damage: Option<f64>,
    /// `range:damage` pairs, e.g. `20:30,40:24`.
    pub damage_ranges: Option<String>,
    pub zone: Option<HitZone>,
    pub head: Option<f64>,
    pub upper_torso: Option<f64>,
    pub lower_torso: Option<f64>,
    pub limbs: Option<f64>,
    pub range_m: Option<f64>,
    pub rpm: Option<f64>,
    pub armor_plates: Option<u32>,
    pub open_delay_ms: Option<f64>,
}

/// Parse `range:damage` pairs separated by commas.
pub fn parse_damage_ranges(s: &str) -> Result<DamageProfile, ApiError> {
    let mut brackets = Vec::new();
    for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (range, damage) = pair.split_once(':').ok_or_else(|| {
            ApiError::BadRequest(format!("damage range '{}' must be range:damage", pair))
        })?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| !n.is_nan() && *n >= 0.0)
                .ok_or_else(|| ApiError::BadRequest(format!("bad number '{}' in damage ranges", v)))
        };
        brackets.push(DamageRange {
            max_range_m: parse(range)?,
            damage: parse(damage)?,
        });
    }
    if brackets.is_empty() {
        return Err(ApiError::BadRequest("damage_ranges is empty".to_string()));
    }
    Ok(DamageProfile::new(brackets))
}

pub async fn cod_ttk(ApiQuery(params): ApiQuery<CodParams>) -> CalcResponse<CodTtkResult> {
    let d = CodInput::default();
    let profile = match (&params.damage_ranges, params.damage) {
        (Some(ranges), _) => parse_damage_ranges(ranges)?,
        (None, Some(damage)) => DamageProfile::flat(damage),
        (None, None) => d.profile,
    };
    let m = HitMultipliers::default();
    let input = CodInput {
        profile,
        multipliers: HitMultipliers {
            head: params.head.unwrap_or(m.head),
            upper_torso: params.upper_torso.unwrap_or(m.upper_torso),
            lower_torso: params.lower_torso.unwrap_or(m.lower_torso),
            limbs: params.limbs.unwrap_or(m.limbs),
        },
        zone: params.zone.unwrap_or(d.zone),
        range_m: params.range_m.unwrap_or(d.range_m),
        rpm: params.rpm.unwrap_or(d.rpm),
        armor_plates: params.armor_plates.unwrap_or(d.armor_plates),
        open_delay_ms: params.open_delay_ms.unwrap_or(d.open_delay_ms),
    };
    no_store(compute_cod_ttk(&input))
}

pub async fn fortnite_ttk(ApiQuery(input): ApiQuery<FortniteInput>) -> CalcResponse<FortniteTtkResult> {
    no_store(compute_fortnite_ttk(&input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::api::routes::test_support::*;
    use crate::sources::mock::MockUpstream;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    fn app(dir: &TempDir) -> axum::Router {
        build_router(test_state(dir.path(), MockUpstream::new()))
    }

    fn approx(value: &serde_json::Value, expected: f64) -> bool {
        value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-6)
    }

    #[tokio::test]
    async fn test_lol_dps() {
        let dir = TempDir::new().unwrap();
        let (status, headers, json) = get(
            app(&dir),
            "/api/calc/lol/dps?attack_damage=200&attack_speed=1.5&target_hp=3000&target_armor=100",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control(&headers), "no-store");
        assert!(approx(&json["post_mitigation_per_hit"], 100.0));
        assert!(approx(&json["dps"], 150.0));
        assert!(approx(&json["ttk_seconds"], 20.0));
        assert_eq!(json["autos_to_kill"], 30);
    }

    #[tokio::test]
    async fn test_lol_dps_caps_attack_speed() {
        let dir = TempDir::new().unwrap();
        let (_, json) = get_json(app(&dir), "/api/calc/lol/dps?attack_speed=5").await;
        assert!(approx(&json["attack_speed"], 2.5));
    }

    #[tokio::test]
    async fn test_lol_dps_zero_damage_has_no_ttk() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(app(&dir), "/api/calc/lol/dps?attack_damage=0").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["ttk_seconds"].is_null());
        assert!(json["autos_to_kill"].is_null());
    }

    #[tokio::test]
    async fn test_lol_dps_lethality() {
        let dir = TempDir::new().unwrap();
        let (_, json) = get_json(
            app(&dir),
            "/api/calc/lol/dps?target_armor=60&lethality=20&armor_pen_percent=0.5",
        )
        .await;
        // 60 * 0.5 - 20
        assert!(approx(&json["effective_armor"], 10.0));
    }

    #[tokio::test]
    async fn test_kill_check() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(
            app(&dir),
            "/api/calc/lol/kill-check?target_hp=1000&target_armor=100&physical=1000&follow_up_auto=250",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["killable"], false);
        assert!(approx(&json["total_damage"], 500.0));
        assert!(approx(&json["remaining_hp"], 500.0));
        assert_eq!(json["follow_up_autos"], 4);
    }

    #[tokio::test]
    async fn test_kill_check_requires_hp() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(app(&dir), "/api/calc/lol/kill-check?physical=100").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_ehp() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(
            app(&dir),
            "/api/calc/lol/ehp?hp=1000&armor=100&magic_resist=50&physical_share=1&magic_share=0",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(approx(&json["physical_ehp"], 2000.0));
        assert!(approx(&json["magic_ehp"], 1500.0));
        assert!(approx(&json["mixed_ehp"], 2000.0));
        assert!(approx(&json["armor_damage_reduction"], 0.5));
    }

    #[tokio::test]
    async fn test_osrs_dps_defaults() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(
            app(&dir),
            "/api/calc/osrs/dps?attack_bonus=80&strength_bonus=80&target_hp=150",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["max_hit"], 19);
        assert_eq!(json["attack_roll"], 11952);
        assert!(approx(&json["dps"], 3.852_031_568));
    }

    #[tokio::test]
    async fn test_osrs_dps_against_monster() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path(), MockUpstream::new());
        std::fs::write(
            dir.path().join("fixtures").join("osrs_monsters.json"),
            r#"[{"name":"Training dummy","hitpoints":150,"defence_level":1,"slash_defence":0}]"#,
        )
        .unwrap();
        let app = build_router(state);

        let (status, json) = get_json(
            app.clone(),
            "/api/calc/osrs/dps?attack_bonus=80&strength_bonus=80&monster=training%20dummy&style=slash",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(approx(&json["ttk_seconds"], 38.940_490_84));

        let (status, json) = get_json(app, "/api/calc/osrs/dps?monster=Vorkath").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_cod_ttk_with_ranges() {
        let dir = TempDir::new().unwrap();
        let (status, headers, json) = get(
            app(&dir),
            "/api/calc/cod/ttk?damage_ranges=20:30,40:24&range_m=25&rpm=750",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control(&headers), "no-store");
        assert!(approx(&json["damage_per_shot"], 24.0));
        assert_eq!(json["shots_to_kill"], 5);
        assert!(approx(&json["ttk_ms"], 320.0));
    }

    #[tokio::test]
    async fn test_cod_ttk_armor_and_headshot() {
        let dir = TempDir::new().unwrap();
        let (_, json) = get_json(
            app(&dir),
            "/api/calc/cod/ttk?damage=30&zone=head&head=1.5&armor_plates=3",
        )
        .await;
        // 250 health at 45 per shot
        assert!(approx(&json["target_health"], 250.0));
        assert_eq!(json["shots_to_kill"], 6);
    }

    #[tokio::test]
    async fn test_cod_ttk_bad_ranges() {
        let dir = TempDir::new().unwrap();
        let (status, _) = get_json(app(&dir), "/api/calc/cod/ttk?damage_ranges=20-30").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fortnite_ttk() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(app(&dir), "/api/calc/fortnite/ttk").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["shots_to_eliminate"], 7);
        assert!(approx(&json["ttk_seconds"], 1.2));

        let (_, json) = get_json(app(&dir), "/api/calc/fortnite/ttk?headshot=true").await;
        assert_eq!(json["shots_to_eliminate"], 5);
        assert!(approx(&json["ttk_seconds"], 0.8));
    }

    #[test]
    fn test_parse_damage_ranges() {
        let profile = parse_damage_ranges("40:24, 20:30").unwrap();
        assert_eq!(profile.damage_at(10.0), 30.0);
        assert_eq!(profile.damage_at(30.0), 24.0);

        assert!(parse_damage_ranges("").is_err());
        assert!(parse_damage_ranges("20:abc").is_err());
        assert!(parse_damage_ranges("20:-5").is_err());
    }

    #[tokio::test]
    async fn test_ehp_missing_hp_is_json_error() {
        let dir = TempDir::new().unwrap();
        let (status, headers, json) = get(app(&dir), "/api/calc/lol/ehp?armor=50").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"].as_str().unwrap().contains("hp"));
    }

    #[tokio::test]
    async fn test_fortnite_non_numeric_param_is_json_error() {
        let dir = TempDir::new().unwrap();
        let (status, json) = get_json(app(&dir), "/api/calc/fortnite/ttk?fire_rate=abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
