//! # Game Calc
//!
//! Damage, time-to-kill and build ranking calculators for several games,
//! with a small HTTP API over them and over third-party game data.
//!
//! ## Architecture
//!
//! - **calculate**: Pure calculators (LoL, OSRS, COD, Fortnite) and build ranking
//! - **models**: Core data structures (builds, tiers, hiscores, Riot payloads)
//! - **fetch**: HTTP fetching with retries and an on-disk response cache
//! - **sources**: Typed clients for Riot, Data Dragon, Blizzard and OSRS hiscores
//! - **storage**: Data directory layout and JSON fixtures
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod sources;
pub mod storage;

pub use models::*;
