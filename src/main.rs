use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use game_calc::api::routes::calc::parse_damage_ranges;
use game_calc::api::state::AppState;
use game_calc::calculate::cod::{compute_cod_ttk, CodInput, DamageProfile, HitMultipliers, HitZone};
use game_calc::calculate::fortnite::{compute_fortnite_ttk, FortniteInput};
use game_calc::calculate::lol::{auto_attack_dps, AutoAttackInput, Penetration};
use game_calc::calculate::osrs::{compute_osrs_dps, OsrsMeleeInput, Stance};
use game_calc::calculate::ranking::{filter_builds, rank_builds, BuildFilter, RankingOptions};
use game_calc::config::AppConfig;
use game_calc::models::AttackStyle;
use game_calc::sources::riot::{Platform, RiotId};
use game_calc::storage::{find_monster, load_meta_builds, load_monsters, StorageConfig};

#[derive(Parser)]
#[command(name = "game-calc")]
#[command(about = "Gaming DPS/TTK calculators and game-data lookups")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./game-calc.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// OSRS melee DPS
    Osrs {
        #[arg(long, default_value = "75")]
        attack: u32,

        #[arg(long, default_value = "75")]
        strength: u32,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        attack_bonus: i32,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        strength_bonus: i32,

        /// accurate, aggressive, controlled or defensive
        #[arg(long, default_value = "aggressive", value_parser = parse_enum::<Stance>)]
        stance: Stance,

        /// Attack speed in game ticks
        #[arg(long, default_value = "4")]
        speed: u32,

        /// Monster from the fixtures
        #[arg(long)]
        monster: Option<String>,

        /// stab, slash or crush
        #[arg(long, default_value = "slash", value_parser = parse_enum::<AttackStyle>)]
        style: AttackStyle,

        #[arg(long, default_value = "1")]
        defence_level: u32,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        defence_bonus: i32,

        #[arg(long, default_value = "100")]
        hp: u32,

        /// Take attack and strength from this player's hiscores
        #[arg(long)]
        player: Option<String>,
    },

    /// League of Legends auto-attack DPS
    LolDps {
        #[arg(long, default_value = "100")]
        ad: f64,

        #[arg(long, default_value = "1.0")]
        attack_speed: f64,

        /// Crit chance as a fraction
        #[arg(long, default_value = "0")]
        crit_chance: f64,

        #[arg(long, default_value = "1.75")]
        crit_damage: f64,

        #[arg(long, default_value = "0")]
        on_hit_magic: f64,

        #[arg(long, default_value = "2000")]
        target_hp: f64,

        #[arg(long, default_value = "100", allow_hyphen_values = true)]
        armor: f64,

        #[arg(long, default_value = "50", allow_hyphen_values = true)]
        mr: f64,

        #[arg(long, default_value = "0")]
        lethality: f64,

        /// Percent armor penetration as a fraction
        #[arg(long, default_value = "0")]
        armor_pen: f64,
    },

    /// Call of Duty time-to-kill
    Cod {
        /// Flat damage per shot
        #[arg(long, default_value = "30")]
        damage: f64,

        /// Damage by range, e.g. "20:30,40:24" (overrides --damage)
        #[arg(long)]
        ranges: Option<String>,

        /// head, upper_torso, lower_torso or limbs
        #[arg(long, default_value = "upper_torso", value_parser = parse_enum::<HitZone>)]
        zone: HitZone,

        /// Headshot multiplier
        #[arg(long, default_value = "1.0")]
        head: f64,

        #[arg(long, default_value = "10")]
        range: f64,

        #[arg(long, default_value = "750")]
        rpm: f64,

        #[arg(long, default_value = "0")]
        plates: u32,

        #[arg(long, default_value = "0")]
        open_delay_ms: f64,
    },

    /// Fortnite time-to-eliminate
    Fortnite {
        #[arg(long, default_value = "30")]
        damage: f64,

        #[arg(long)]
        headshot: bool,

        #[arg(long, default_value = "1.5")]
        headshot_multiplier: f64,

        #[arg(long, default_value = "1")]
        pellets: u32,

        /// Shots per second
        #[arg(long, default_value = "5")]
        fire_rate: f64,

        #[arg(long, default_value = "30")]
        magazine: u32,

        #[arg(long, default_value = "2.3")]
        reload: f64,

        #[arg(long, default_value = "100")]
        health: f64,

        #[arg(long, default_value = "100")]
        shield: f64,
    },

    /// Rank meta builds from the fixtures
    Builds {
        #[arg(long)]
        champion: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        patch: Option<String>,

        #[arg(long)]
        mode: Option<String>,

        #[arg(long, default_value = "0")]
        min_games: u32,

        /// Rows to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Look up a League of Legends summoner
    Profile {
        /// Riot ID as Name#TAG or Name-TAG
        riot_id: String,

        /// Platform (defaults to config)
        #[arg(long)]
        platform: Option<String>,

        /// Recent matches to fetch (defaults to config)
        #[arg(long)]
        matches: Option<u32>,
    },

    /// Look up OSRS hiscores
    Hiscores {
        player: String,
    },

    /// Print the effective configuration with secrets masked
    Config,
}

/// Parse a lowercase serde enum name from the command line.
fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase()))
        .map_err(|_| format!("invalid value '{}'", s))
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn fmt_secs(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}s", v))
        .unwrap_or_else(|| "never".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(Some(cli.config.as_path()))
        .with_context(|| format!("loading config from {:?}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let fmt_layer = if cli.json_logs {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("game-calc v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = format!("{}:{}", config.server.host, config.server.port);

            let state = AppState::from_config(config)?;
            let app = game_calc::api::build_router(state);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Osrs {
            attack,
            strength,
            attack_bonus,
            strength_bonus,
            stance,
            speed,
            monster,
            style,
            defence_level,
            defence_bonus,
            hp,
            player,
        } => {
            let mut input = OsrsMeleeInput {
                attack_level: attack,
                strength_level: strength,
                attack_bonus,
                strength_bonus,
                stance,
                speed_ticks: speed,
                target_defence_level: defence_level,
                target_defence_bonus: defence_bonus,
                target_hp: hp,
                ..OsrsMeleeInput::default()
            };

            if let Some(name) = &monster {
                let storage = StorageConfig::new(config.data_dir.clone());
                let monsters = load_monsters(&storage)?;
                let found = find_monster(&monsters, name)
                    .ok_or_else(|| anyhow!("monster '{}' not in fixtures", name))?;
                input = input.against(found, style);
            }
            if let Some(player) = &player {
                let state = AppState::from_config(config)?;
                let hiscores = state.hiscores.lookup(player).await?;
                input = input.with_hiscores(&hiscores);
            }

            let r = compute_osrs_dps(&input);
            println!("\n=== OSRS Melee ===");
            println!("Attack / Strength: {} / {}", input.attack_level, input.strength_level);
            println!("Max hit:           {}", r.max_hit);
            println!("Attack roll:       {}", r.attack_roll);
            println!("Defence roll:      {}", r.defence_roll);
            println!("Hit chance:        {:.2}%", r.hit_chance * 100.0);
            println!("DPS:               {:.3}", r.dps);
            println!("Time to kill:      {}", fmt_secs(r.ttk_seconds));
            println!("Hits to kill:      {}", fmt_opt(r.expected_hits_to_kill));
        }
        Commands::LolDps {
            ad,
            attack_speed,
            crit_chance,
            crit_damage,
            on_hit_magic,
            target_hp,
            armor,
            mr,
            lethality,
            armor_pen,
        } => {
            let input = AutoAttackInput {
                attack_damage: ad,
                attack_speed,
                crit_chance,
                crit_damage,
                on_hit_magic,
                target_hp,
                target_armor: armor,
                target_magic_resist: mr,
                armor_pen: Penetration {
                    flat_pen: lethality,
                    percent_pen: armor_pen,
                    ..Penetration::default()
                },
                ..AutoAttackInput::default()
            };

            let r = auto_attack_dps(&input);
            println!("\n=== LoL Auto Attacks ===");
            println!("Attack speed:      {:.3}", r.attack_speed);
            println!("Effective armor:   {:.1}", r.effective_armor);
            println!("Damage per hit:    {:.1}", r.post_mitigation_per_hit);
            println!("DPS:               {:.1}", r.dps);
            println!("Time to kill:      {}", fmt_secs(r.ttk_seconds));
            println!("Autos to kill:     {}", fmt_opt(r.autos_to_kill));
        }
        Commands::Cod {
            damage,
            ranges,
            zone,
            head,
            range,
            rpm,
            plates,
            open_delay_ms,
        } => {
            let profile = match ranges {
                Some(ranges) => parse_damage_ranges(&ranges)?,
                None => DamageProfile::flat(damage),
            };
            let input = CodInput {
                profile,
                multipliers: HitMultipliers {
                    head,
                    ..HitMultipliers::default()
                },
                zone,
                range_m: range,
                rpm,
                armor_plates: plates,
                open_delay_ms,
            };

            let r = compute_cod_ttk(&input);
            println!("\n=== COD TTK ===");
            println!("Target health:     {}", r.target_health);
            println!("Damage per shot:   {:.1}", r.damage_per_shot);
            println!("Shots to kill:     {}", fmt_opt(r.shots_to_kill));
            println!(
                "TTK:               {}",
                r.ttk_ms
                    .map(|ms| format!("{:.0}ms", ms))
                    .unwrap_or_else(|| "never".to_string())
            );
        }
        Commands::Fortnite {
            damage,
            headshot,
            headshot_multiplier,
            pellets,
            fire_rate,
            magazine,
            reload,
            health,
            shield,
        } => {
            let input = FortniteInput {
                body_damage: damage,
                headshot_multiplier,
                headshot,
                pellets_hit: pellets,
                fire_rate,
                magazine_size: magazine,
                reload_seconds: reload,
                target_health: health,
                target_shield: shield,
            };

            let r = compute_fortnite_ttk(&input);
            println!("\n=== Fortnite TTK ===");
            println!("Effective HP:      {}", r.effective_hp);
            println!("Damage per shot:   {:.1}", r.damage_per_shot);
            println!("Shots:             {}", fmt_opt(r.shots_to_eliminate));
            println!(
                "Magazines:         {}{}",
                fmt_opt(r.magazines_needed),
                if r.needs_reload { " (reload needed)" } else { "" }
            );
            println!("Burst DPS:         {:.1}", r.burst_dps);
            println!("Sustained DPS:     {:.1}", r.sustained_dps);
            println!("Time to eliminate: {}", fmt_secs(r.ttk_seconds));
        }
        Commands::Builds {
            champion,
            role,
            patch,
            mode,
            min_games,
            limit,
        } => {
            let storage = StorageConfig::new(config.data_dir.clone());
            let builds = load_meta_builds(&storage)?;
            let filter = BuildFilter {
                champion,
                role,
                patch,
                mode,
            };
            let options = RankingOptions {
                min_games,
                ..RankingOptions::default()
            };
            let ranked = rank_builds(filter_builds(&builds, &filter), &options);

            println!("\n=== Builds ({} ranked) ===", ranked.len());
            for b in ranked.iter().take(limit) {
                let caveat = if b.confidence.needs_caveat() {
                    " (low sample)"
                } else {
                    ""
                };
                println!(
                    "{} {:<12} {:<8} {:<6} {:>6.1}% of {:>6} (score {:.3}, {}{}) {:?}",
                    b.tier,
                    b.build.champion,
                    b.build.role,
                    b.build.patch,
                    b.win_rate * 100.0,
                    b.build.games,
                    b.score,
                    b.confidence,
                    caveat,
                    b.build.items
                );
            }
        }
        Commands::Profile {
            riot_id,
            platform,
            matches,
        } => {
            let platform: Platform = platform
                .as_deref()
                .unwrap_or(&config.riot.platform)
                .parse()?;
            let riot_id = RiotId::parse(&riot_id)?;
            let match_count = matches.unwrap_or(config.riot.match_count);

            let state = AppState::from_config(config)?;
            let profile = state
                .riot()?
                .lookup_profile(&riot_id, platform, match_count)
                .await?;

            println!("\n=== {} ({}) ===", profile.riot_id, profile.platform);
            println!("Level:             {}", profile.summoner_level);
            for q in &profile.ranked {
                println!(
                    "{:<18} {} {} {} LP ({}W {}L, {:.1}%)",
                    q.queue_type,
                    q.tier.as_deref().unwrap_or("UNRANKED"),
                    q.rank.as_deref().unwrap_or(""),
                    q.league_points,
                    q.wins,
                    q.losses,
                    q.win_rate * 100.0
                );
            }
            for m in &profile.recent_matches {
                println!(
                    "  {} {:<12} {}/{}/{} ({:.2} KDA)",
                    if m.win { "W" } else { "L" },
                    m.champion,
                    m.kills,
                    m.deaths,
                    m.assists,
                    m.kda
                );
            }
            if let (Some(wr), Some(kda)) = (profile.recent_win_rate, profile.average_kda) {
                println!("Recent:            {:.0}% wins, {:.2} KDA", wr * 100.0, kda);
            }
        }
        Commands::Hiscores { player } => {
            let state = AppState::from_config(config)?;
            let hiscores = state.hiscores.lookup(&player).await?;

            println!("\n=== {} ===", hiscores.player);
            println!("Combat level:      {}", fmt_opt(hiscores.combat_level()));
            for s in &hiscores.skills {
                println!(
                    "{:<14} {:>4} {:>12} {:>10}",
                    format!("{:?}", s.skill),
                    s.level,
                    fmt_opt(s.xp),
                    fmt_opt(s.rank)
                );
            }
        }
        Commands::Config => {
            print!("{}", config.redacted().to_toml()?);
        }
    }

    Ok(())
}
