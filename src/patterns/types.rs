//! Pattern descriptions.

use serde::{Deserialize, Serialize};

/// How a pattern string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    #[default]
    Glob,
    Regex,
}

/// What a pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternScope {
    /// The repository-relative path with forward slashes.
    #[default]
    Path,
    /// The final path component only.
    Filename,
    /// The file's text content.
    Content,
}

/// Catalog a pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSet {
    PrivatePath,
    Credential,
    Backup,
    ReservedName,
    Custom,
}

impl PatternSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternSet::PrivatePath => "private_path",
            PatternSet::Credential => "credential",
            PatternSet::Backup => "backup",
            PatternSet::ReservedName => "reserved_name",
            PatternSet::Custom => "custom",
        }
    }
}

/// A single sensitive pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitivePattern {
    pub pattern: String,
    pub kind: PatternKind,
    pub scope: PatternScope,
    pub case_sensitive: bool,
    pub set: PatternSet,
}

impl SensitivePattern {
    /// Case-insensitive glob over the full path.
    pub fn path_glob(pattern: &str, set: PatternSet) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind: PatternKind::Glob,
            scope: PatternScope::Path,
            case_sensitive: false,
            set,
        }
    }

    /// Case-insensitive glob over the file name.
    pub fn filename_glob(pattern: &str, set: PatternSet) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind: PatternKind::Glob,
            scope: PatternScope::Filename,
            ..Self::path_glob("", set)
        }
    }

    /// Regex over file content.
    pub fn content_regex(pattern: &str, set: PatternSet) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind: PatternKind::Regex,
            scope: PatternScope::Content,
            case_sensitive: true,
            set,
        }
    }
}

/// Which pattern matched a path or content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern: String,
    pub set: PatternSet,
}
