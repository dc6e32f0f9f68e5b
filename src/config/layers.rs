//! Layered configuration loading.
//!
//! Each layer is turned into a `serde_yaml::Value` mapping and deep-merged over
//! the previous one (mappings merge key by key, anything else replaces), then
//! the result is deserialized once into `Config` and validated.

use super::model::Config;
use super::types::PrivateSetSelector;
use crate::context::PROJECT_CONFIG_FILE;
use crate::error::{RepokitError, Result};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment variables read into the configuration.
///
/// `REPOKIT_STRATEGY=simple` sets `strategy`; a double underscore descends
/// into nested tables (`REPOKIT_SENSITIVE__MAX_FILE_BYTES=1024`). List-valued
/// keys take comma-separated values.
pub const ENV_PREFIX: &str = "REPOKIT_";

/// Where the configuration layers come from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub user_file: Option<PathBuf>,
    pub project_file: Option<PathBuf>,
    /// `REPOKIT_*` variables, already filtered.
    pub env: Vec<(String, String)>,
}

impl ConfigSources {
    /// The standard sources for a repository rooted at `repo_root`.
    pub fn discover(repo_root: &Path) -> Self {
        Self {
            user_file: user_config_path(),
            project_file: Some(repo_root.join(PROJECT_CONFIG_FILE)),
            env: std::env::vars()
                .filter(|(k, _)| k.starts_with(ENV_PREFIX))
                .collect(),
        }
    }
}

/// `~/.config/repokit/config.yml` on Linux, the platform equivalent elsewhere.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("repokit").join("config.yml"))
}

/// Per-call overrides, typically from CLI flags. Highest precedence.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub strategy: Option<String>,
    pub directory_profile: Option<String>,
    pub directory_groups: Option<Vec<String>>,
    pub directories: Option<Vec<String>>,
    pub private_set: Option<PrivateSetSelector>,
    pub worktrees_dir: Option<String>,
}

impl ConfigOverrides {
    fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        let mut set = |key: &str, value: Value| {
            map.insert(Value::String(key.to_string()), value);
        };
        if let Some(s) = &self.strategy {
            set("strategy", Value::String(s.clone()));
            // A named strategy on the command line wins over a configured custom one.
            set("custom_strategy", Value::Null);
        }
        if let Some(p) = &self.directory_profile {
            set("directory_profile", Value::String(p.clone()));
        }
        if let Some(groups) = &self.directory_groups {
            set("directory_groups", string_list(groups));
        }
        if let Some(dirs) = &self.directories {
            set("directories", string_list(dirs));
        }
        if let Some(sel) = self.private_set {
            set("private_set", Value::String(sel.as_str().to_string()));
        }
        if let Some(dir) = &self.worktrees_dir {
            set("worktrees_dir", Value::String(dir.clone()));
        }
        Value::Mapping(map)
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Sequence(items.iter().cloned().map(Value::String).collect())
}

impl Config {
    /// Load the merged configuration for `repo_root` from the standard sources.
    pub fn load_layered(repo_root: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        Self::from_sources(&ConfigSources::discover(repo_root), overrides)
    }

    /// Merge defaults, user file, project file, environment and overrides.
    pub fn from_sources(sources: &ConfigSources, overrides: &ConfigOverrides) -> Result<Self> {
        let defaults = serde_yaml::to_value(Config::default()).map_err(|e| {
            RepokitError::UserError(format!("failed to serialize default config: {}", e))
        })?;
        let mut merged = defaults.clone();

        for file in [&sources.user_file, &sources.project_file]
            .into_iter()
            .flatten()
        {
            if file.exists() {
                debug!(path = %file.display(), "loading config layer");
                merge_values(&mut merged, read_yaml_file(file)?);
            }
        }

        merge_values(&mut merged, env_layer(&sources.env, &defaults));
        merge_values(&mut merged, overrides.to_value());

        let config: Config = serde_yaml::from_value(merged)
            .map_err(|e| RepokitError::UserError(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

fn read_yaml_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })?;
    // An empty file parses as null; treat it as "no settings".
    Ok(if value.is_null() {
        Value::Mapping(Mapping::new())
    } else {
        value
    })
}

/// Deep-merge `overlay` into `base`.
pub(crate) fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_mapping() && value.is_mapping() => {
                        merge_values(existing, value);
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Build a mapping from `REPOKIT_*` variables.
///
/// `defaults` decides how a value is parsed: keys whose default is a list are
/// split on commas, everything else is read as a YAML scalar.
fn env_layer(vars: &[(String, String)], defaults: &Value) -> Value {
    let mut root = Value::Mapping(Mapping::new());

    for (key, raw) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = stripped
            .split("__")
            .map(|segment| segment.to_ascii_lowercase())
            .collect();
        if path.iter().any(|s| s.is_empty()) {
            continue;
        }

        let default_at_path = path
            .iter()
            .try_fold(defaults, |node, segment| node.get(segment.as_str()));
        let value = match default_at_path {
            Some(Value::Sequence(_)) => Value::Sequence(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
            Some(Value::String(_)) | None => Value::String(raw.clone()),
            Some(_) => serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())),
        };

        debug!(variable = %key, "applying environment override");
        let mut nested = value;
        for segment in path.iter().rev() {
            let mut map = Mapping::new();
            map.insert(Value::String(segment.clone()), nested);
            nested = Value::Mapping(map);
        }
        merge_values(&mut root, nested);
    }

    root
}
