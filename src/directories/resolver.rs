//! Pure directory resolution.

use super::catalog::{DEFAULT_DIRECTORIES, DirectoryCatalog, private_set_members};
use crate::config::{Config, PrivateSetSelector};
use crate::error::{RepokitError, Result};
use serde::{Deserialize, Serialize};

/// Final ordered directory list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResolvedDirectorySet {
    pub directories: Vec<String>,
}

impl ResolvedDirectorySet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.directories.iter().map(String::as_str)
    }

    pub fn contains(&self, dir: &str) -> bool {
        self.directories.iter().any(|d| d == dir)
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

/// The selected private directories, by actual name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateDirectorySet {
    pub selector: PrivateSetSelector,
    pub directories: Vec<String>,
}

impl PrivateDirectorySet {
    pub fn contains(&self, dir: &str) -> bool {
        self.directories.iter().any(|d| d == dir)
    }
}

/// Resolve against the built-in catalog.
pub fn resolve(
    profile: Option<&str>,
    groups: &[String],
    explicit: &[String],
    private_set: PrivateSetSelector,
) -> Result<(ResolvedDirectorySet, PrivateDirectorySet)> {
    DirectoryCatalog::builtin().resolve(profile, groups, explicit, private_set)
}

impl DirectoryCatalog {
    /// Resolve the directory layout and the private set.
    ///
    /// Every profile and group name is checked before anything is assembled,
    /// so an unknown name leaves no partial result behind.
    pub fn resolve(
        &self,
        profile: Option<&str>,
        groups: &[String],
        explicit: &[String],
        private_set: PrivateSetSelector,
    ) -> Result<(ResolvedDirectorySet, PrivateDirectorySet)> {
        let base: Vec<String> = match profile {
            Some(name) => self
                .profiles
                .get(name)
                .cloned()
                .ok_or_else(|| RepokitError::UnknownProfile(name.to_string()))?,
            None => DEFAULT_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
        };

        let mut group_lists = Vec::with_capacity(groups.len());
        for group in groups {
            let members = self
                .groups
                .get(group)
                .ok_or_else(|| RepokitError::UnknownGroup(group.clone()))?;
            group_lists.push(members);
        }

        let mut directories: Vec<String> = Vec::new();
        let candidates = base
            .iter()
            .chain(group_lists.into_iter().flatten())
            .chain(explicit.iter());
        for dir in candidates {
            let actual = self.actual_name(dir.trim_matches('/')).to_string();
            if !actual.is_empty() && !directories.contains(&actual) {
                directories.push(actual);
            }
        }

        Ok((
            ResolvedDirectorySet { directories },
            self.private_directories(private_set),
        ))
    }

    /// The private directories for `selector`, after type mapping.
    pub fn private_directories(&self, selector: PrivateSetSelector) -> PrivateDirectorySet {
        let mut directories: Vec<String> = Vec::new();
        for member in private_set_members(selector) {
            let actual = self.actual_name(&member).to_string();
            if !directories.contains(&actual) {
                directories.push(actual);
            }
        }
        PrivateDirectorySet {
            selector,
            directories,
        }
    }

    /// Resolve the selection recorded in a merged configuration.
    pub fn resolve_config(
        &self,
        config: &Config,
    ) -> Result<(ResolvedDirectorySet, PrivateDirectorySet)> {
        self.resolve(
            config.directory_profile.as_deref(),
            &config.directory_groups,
            &config.directories,
            config.private_set,
        )
    }
}
