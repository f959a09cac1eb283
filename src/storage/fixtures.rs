//! Static JSON fixtures.
//!
//! Each fixture is a JSON array of records. A missing fixture is treated as
//! empty so the calculators keep working without data files.

use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{StorageConfig, StorageError};
use crate::models::{MetaBuild, Monster};

/// Fixture files shipped in the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixture {
    MetaBuilds,
    OsrsMonsters,
}

impl Fixture {
    pub fn filename(&self) -> &'static str {
        match self {
            Fixture::MetaBuilds => "meta_builds.json",
            Fixture::OsrsMonsters => "osrs_monsters.json",
        }
    }

    pub fn path(&self, config: &StorageConfig) -> PathBuf {
        config.fixtures_dir().join(self.filename())
    }
}

/// Read a fixture array. Missing file yields an empty vec.
pub fn load_fixture<T: DeserializeOwned>(
    config: &StorageConfig,
    fixture: Fixture,
) -> Result<Vec<T>, StorageError> {
    let path = fixture.path(config);
    if !path.exists() {
        warn!("Fixture {:?} not found, treating as empty", path);
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path)?;
    let items: Vec<T> =
        serde_json::from_str(&content).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
    debug!("Loaded {} records from {:?}", items.len(), path);
    Ok(items)
}

pub fn load_meta_builds(config: &StorageConfig) -> Result<Vec<MetaBuild>, StorageError> {
    load_fixture(config, Fixture::MetaBuilds)
}

pub fn load_monsters(config: &StorageConfig) -> Result<Vec<Monster>, StorageError> {
    load_fixture(config, Fixture::OsrsMonsters)
}

/// Case-insensitive monster lookup by name.
pub fn find_monster<'a>(monsters: &'a [Monster], name: &str) -> Option<&'a Monster> {
    let name = name.trim();
    monsters.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}
