//! The ordered list of loaded mods the predicates are evaluated against.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Read access to the host's list of active mods, in load order.
pub trait ModRegistry {
    fn is_loaded(&self, name: &str) -> bool {
        self.load_index(name).is_some()
    }

    /// Position in the load order, `None` if the mod is not active.
    fn load_index(&self, name: &str) -> Option<usize>;

    /// Version string the mod targets, as declared in its metadata.
    fn target_version(&self, name: &str) -> Option<&str>;

    /// Version string from the mod's ModSync metadata, if it ships one.
    fn sync_version(&self, name: &str) -> Option<&str>;

    /// True if `first` loads before `last`. Vacuously true when either is
    /// not loaded.
    fn loads_before(&self, first: &str, last: &str) -> bool {
        match (self.load_index(first), self.load_index(last)) {
            (Some(first), Some(last)) => first < last,
            _ => true,
        }
    }
}

/// One active mod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInfo {
    pub name: String,
    #[serde(default)]
    pub target_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_version: Option<String>,
}

impl ModInfo {
    pub fn new(name: &str, target_version: &str) -> Self {
        Self {
            name: name.to_string(),
            target_version: target_version.to_string(),
            sync_version: None,
        }
    }

    pub fn with_sync_version(mut self, version: &str) -> Self {
        self.sync_version = Some(version.to_string());
        self
    }
}

/// Active mods keyed by name, iterated in load order.
///
/// A name listed twice keeps its first load position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ModInfo>", into = "Vec<ModInfo>")]
pub struct ModList {
    mods: IndexMap<String, ModInfo>,
}

impl ModList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, info: ModInfo) {
        self.mods.entry(info.name.clone()).or_insert(info);
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModInfo> {
        self.mods.values()
    }

    pub fn get(&self, name: &str) -> Option<&ModInfo> {
        self.mods.get(name)
    }
}

impl From<Vec<ModInfo>> for ModList {
    fn from(mods: Vec<ModInfo>) -> Self {
        let mut list = ModList::new();
        for info in mods {
            list.push(info);
        }
        list
    }
}

impl From<ModList> for Vec<ModInfo> {
    fn from(list: ModList) -> Self {
        list.mods.into_values().collect()
    }
}

impl FromIterator<ModInfo> for ModList {
    fn from_iter<T: IntoIterator<Item = ModInfo>>(iter: T) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl ModRegistry for ModList {
    fn load_index(&self, name: &str) -> Option<usize> {
        self.mods.get_index_of(name)
    }

    fn target_version(&self, name: &str) -> Option<&str> {
        self.mods.get(name).map(|m| m.target_version.as_str())
    }

    fn sync_version(&self, name: &str) -> Option<&str> {
        self.mods
            .get(name)
            .and_then(|m| m.sync_version.as_deref())
            .filter(|v| !v.is_empty())
    }
}

// ── Versions ──────────────────────────────────────────────────────────────

/// Why two version strings could not be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string at hand is not dot-separated integers.
    Malformed(String),
    /// Both parse but have a different number of parts.
    Shape,
}

/// Splits `1.2.3` into `[1, 2, 3]`.
pub fn parse_version(version: &str) -> Result<Vec<u32>, VersionError> {
    version
        .trim()
        .split('.')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| VersionError::Malformed(version.to_string()))
        })
        .collect()
}

/// True if no part of `found` is below the matching part of `wanted`.
///
/// Parts are checked independently: `1.3.0` does not satisfy `1.2.5`.
pub fn version_at_least(found: &str, wanted: &str) -> Result<bool, VersionError> {
    let wanted = parse_version(wanted)?;
    let found = parse_version(found)?;
    if wanted.len() != found.len() {
        return Err(VersionError::Shape);
    }
    Ok(found.iter().zip(&wanted).all(|(f, w)| f >= w))
}
