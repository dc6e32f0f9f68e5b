//! Built-in profiles, groups and private sets.

use crate::config::{Config, PrivateSetSelector};
use std::collections::BTreeMap;

/// Directories created when no profile is selected.
pub const DEFAULT_DIRECTORIES: &[&str] = &[
    "convos",
    "docs",
    "logs",
    "private",
    "revisions",
    "scripts",
    "tests",
];

const MINIMAL: &[&str] = &["src", "tests", "docs"];
const STANDARD: &[&str] = &[
    "src",
    "tests",
    "docs",
    "scripts",
    "config",
    "logs",
    "private",
    "convos",
    "revisions",
];
const COMPLETE_EXTRA: &[&str] = &["data", "examples", "tools", "resources", "assets"];

const PRIVATE_STANDARD: &[&str] = &["private", "revisions", "logs", "convos"];
const PRIVATE_ENHANCED_EXTRA: &[&str] = &["credentials", "secrets", "local"];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn builtin_profiles() -> BTreeMap<String, Vec<String>> {
    let mut complete = owned(STANDARD);
    complete.extend(owned(COMPLETE_EXTRA));
    BTreeMap::from([
        ("minimal".to_string(), owned(MINIMAL)),
        ("standard".to_string(), owned(STANDARD)),
        ("complete".to_string(), complete),
    ])
}

pub fn builtin_groups() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (
            "development".to_string(),
            owned(&["src", "tests", "scripts", "tools"]),
        ),
        (
            "documentation".to_string(),
            owned(&["docs", "examples", "resources"]),
        ),
        ("operations".to_string(), owned(&["config", "logs", "data"])),
        (
            "privacy".to_string(),
            owned(&["private", "convos", "credentials"]),
        ),
    ])
}

/// Conceptual names of the directories in a private set.
pub fn private_set_members(selector: PrivateSetSelector) -> Vec<String> {
    let mut members = owned(PRIVATE_STANDARD);
    if selector == PrivateSetSelector::Enhanced {
        members.extend(owned(PRIVATE_ENHANCED_EXTRA));
    }
    members
}

/// Profiles, groups and the directory type mapping in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryCatalog {
    pub profiles: BTreeMap<String, Vec<String>>,
    pub groups: BTreeMap<String, Vec<String>>,
    /// Conceptual name to actual directory name.
    pub type_map: BTreeMap<String, String>,
}

impl Default for DirectoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DirectoryCatalog {
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
            groups: builtin_groups(),
            type_map: BTreeMap::new(),
        }
    }

    /// Built-ins with configured profiles and groups added or replaced by name.
    pub fn from_config(config: &Config) -> Self {
        let mut catalog = Self::builtin();
        catalog.profiles.extend(
            config
                .profiles
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        catalog
            .groups
            .extend(config.groups.iter().map(|(k, v)| (k.clone(), v.clone())));
        catalog.type_map = config.directory_types.clone();
        catalog
    }

    /// Actual directory name for a conceptual one.
    pub fn actual_name<'a>(&'a self, conceptual: &'a str) -> &'a str {
        self.type_map
            .get(conceptual)
            .map(String::as_str)
            .unwrap_or(conceptual)
    }
}
