//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{RepokitError, Result};
use std::path::{Component, Path};

impl Config {
    /// Load config from a single YAML file (no layering).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            RepokitError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string. Unknown fields are ignored.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| RepokitError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            RepokitError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `lock_stale_minutes` and `sensitive.max_file_bytes` must be positive
    /// - `worktrees_dir` must be a non-empty relative path inside the repository
    /// - branch directory names must be single path components
    /// - the redaction placeholder must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.lock_stale_minutes == 0 {
            return Err(invalid("lock_stale_minutes must be greater than 0"));
        }

        if self.sensitive.max_file_bytes == 0 {
            return Err(invalid("sensitive.max_file_bytes must be greater than 0"));
        }

        if self.strategy.trim().is_empty() && self.custom_strategy.is_none() {
            return Err(invalid("strategy must not be empty"));
        }

        if !is_inner_relative_path(&self.worktrees_dir) {
            return Err(invalid(&format!(
                "worktrees_dir '{}' must be a relative path inside the repository",
                self.worktrees_dir
            )));
        }

        for (branch, dir) in &self.branch_directories {
            let mut components = Path::new(dir).components();
            let single_normal = matches!(components.next(), Some(Component::Normal(_)))
                && components.next().is_none();
            if !single_normal {
                return Err(invalid(&format!(
                    "branch_directories.{} = '{}' must be a plain directory name",
                    branch, dir
                )));
            }
        }

        for dir in self.directories.iter().chain(self.directory_types.values()) {
            if !is_inner_relative_path(dir) {
                return Err(invalid(&format!(
                    "directory '{}' must be a relative path inside the repository",
                    dir
                )));
            }
        }

        if self.redaction.placeholder.is_empty() {
            return Err(invalid("redaction.placeholder must not be empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> RepokitError {
    RepokitError::UserError(format!("config validation failed: {}", message))
}

fn is_inner_relative_path(raw: &str) -> bool {
    let path = Path::new(raw);
    !raw.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
