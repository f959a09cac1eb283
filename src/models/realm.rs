//! World of Warcraft realm index.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Realm {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Realm index payload. Names arrive either localised to one locale or as
/// a map of all locales.
#[derive(Debug, Clone, Deserialize)]
pub struct RealmIndex {
    pub realms: Vec<RealmIndexEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealmIndexEntry {
    pub id: u64,
    pub name: RealmName,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RealmName {
    Localized(String),
    AllLocales(std::collections::HashMap<String, String>),
}

impl RealmName {
    pub fn resolve(&self, locale: &str) -> Option<String> {
        match self {
            RealmName::Localized(name) => Some(name.clone()),
            RealmName::AllLocales(names) => names
                .get(locale)
                .or_else(|| names.get("en_US"))
                .or_else(|| names.values().next())
                .cloned(),
        }
    }
}

impl RealmIndex {
    /// Flatten into realms sorted by name.
    pub fn into_realms(self, locale: &str) -> Vec<Realm> {
        let mut realms: Vec<Realm> = self
            .realms
            .into_iter()
            .map(|entry| Realm {
                id: entry.id,
                name: entry.name.resolve(locale).unwrap_or_else(|| entry.slug.clone()),
                slug: entry.slug,
            })
            .collect();
        realms.sort_by(|a, b| a.name.cmp(&b.name));
        realms
    }
}
