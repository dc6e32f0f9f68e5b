//! Compiled pattern matching.

use super::defaults::builtin_patterns;
use super::types::{PatternKind, PatternMatch, PatternScope, PatternSet, SensitivePattern};
use crate::config::{Config, SensitivePatternConfig};
use crate::directories::DirectoryCatalog;
use crate::error::{RepokitError, Result};
use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};

enum Engine {
    Glob(GlobMatcher),
    Regex(Regex),
}

impl Engine {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Engine::Glob(glob) => glob.is_match(text),
            Engine::Regex(regex) => regex.is_match(text),
        }
    }
}

struct Compiled {
    engine: Engine,
    pattern: SensitivePattern,
}

/// Every sensitive pattern, compiled once.
///
/// Build one per operation from the merged configuration and share it by
/// reference; it is never mutated after construction.
pub struct PatternMatcher {
    compiled: Vec<Compiled>,
}

impl std::fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternMatcher")
            .field(
                "patterns",
                &self
                    .compiled
                    .iter()
                    .map(|c| &c.pattern.pattern)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PatternMatcher {
    /// Compile the given patterns.
    ///
    /// Returns `UserError` (exit 1) naming the first pattern that fails to compile.
    pub fn new(patterns: Vec<SensitivePattern>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let engine = compile(&pattern)?;
            compiled.push(Compiled { engine, pattern });
        }
        Ok(Self { compiled })
    }

    /// Built-in catalogs for the configured private set plus configured custom patterns.
    pub fn from_config(config: &Config) -> Result<Self> {
        let private = DirectoryCatalog::from_config(config).private_directories(config.private_set);
        let mut patterns = builtin_patterns(&private.directories);
        patterns.extend(config.sensitive.patterns.iter().map(custom_pattern));
        Self::new(patterns)
    }

    /// All patterns in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &SensitivePattern> {
        self.compiled.iter().map(|c| &c.pattern)
    }

    /// First path or filename pattern matching `path`, reserved names excluded.
    ///
    /// `path` is repository-relative; backslashes are normalized to `/`.
    pub fn sensitive_path_match(&self, path: &str) -> Option<PatternMatch> {
        self.path_match_where(path, |set| set != PatternSet::ReservedName)
    }

    /// Whether `path` must never be committed on a public branch.
    pub fn is_sensitive_path(&self, path: &str) -> bool {
        self.sensitive_path_match(path).is_some()
    }

    /// Whether `path` lies in a private directory or is a private file.
    pub fn is_private_path(&self, path: &str) -> bool {
        self.path_match_where(path, |set| set == PatternSet::PrivatePath)
            .is_some()
    }

    /// Reserved-name match for `path`'s final component.
    pub fn reserved_name_match(&self, path: &str) -> Option<PatternMatch> {
        self.path_match_where(path, |set| set == PatternSet::ReservedName)
    }

    /// First content pattern matching `content`.
    pub fn content_match(&self, content: &str) -> Option<PatternMatch> {
        self.compiled
            .iter()
            .filter(|c| c.pattern.scope == PatternScope::Content)
            .find(|c| c.engine.is_match(content))
            .map(|c| to_match(&c.pattern))
    }

    /// Whether any content pattern is configured.
    pub fn has_content_patterns(&self) -> bool {
        self.compiled
            .iter()
            .any(|c| c.pattern.scope == PatternScope::Content)
    }

    fn path_match_where(
        &self,
        path: &str,
        wanted: impl Fn(PatternSet) -> bool,
    ) -> Option<PatternMatch> {
        let normalized = path.replace('\\', "/");
        let normalized = normalized.trim_start_matches("./");
        let filename = normalized.rsplit('/').next().unwrap_or(normalized);

        self.compiled
            .iter()
            .filter(|c| wanted(c.pattern.set))
            .find(|c| match c.pattern.scope {
                PatternScope::Path => c.engine.is_match(normalized),
                PatternScope::Filename => c.engine.is_match(filename),
                PatternScope::Content => false,
            })
            .map(|c| to_match(&c.pattern))
    }
}

fn to_match(pattern: &SensitivePattern) -> PatternMatch {
    PatternMatch {
        pattern: pattern.pattern.clone(),
        set: pattern.set,
    }
}

fn custom_pattern(config: &SensitivePatternConfig) -> SensitivePattern {
    match config {
        SensitivePatternConfig::Glob(glob) => SensitivePattern::path_glob(glob, PatternSet::Custom),
        SensitivePatternConfig::Full {
            pattern,
            kind,
            scope,
            case_sensitive,
        } => SensitivePattern {
            pattern: pattern.clone(),
            kind: *kind,
            scope: *scope,
            case_sensitive: *case_sensitive,
            set: PatternSet::Custom,
        },
    }
}

fn compile(pattern: &SensitivePattern) -> Result<Engine> {
    match pattern.kind {
        PatternKind::Glob => {
            if pattern.scope == PatternScope::Content {
                return Err(invalid(pattern, "content patterns must be regexes"));
            }
            let glob = GlobBuilder::new(&pattern.pattern)
                .case_insensitive(!pattern.case_sensitive)
                .build()
                .map_err(|e| invalid(pattern, &e.to_string()))?;
            Ok(Engine::Glob(glob.compile_matcher()))
        }
        PatternKind::Regex => {
            let regex = RegexBuilder::new(&pattern.pattern)
                .case_insensitive(!pattern.case_sensitive)
                .build()
                .map_err(|e| invalid(pattern, &e.to_string()))?;
            Ok(Engine::Regex(regex))
        }
    }
}

fn invalid(pattern: &SensitivePattern, reason: &str) -> RepokitError {
    RepokitError::UserError(format!(
        "invalid sensitive pattern '{}': {}\n\
         Fix: edit the sensitive.patterns list in your repokit config.",
        pattern.pattern, reason
    ))
}
