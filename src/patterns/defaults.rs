//! Built-in pattern catalogs.

use super::types::{PatternKind, PatternScope, PatternSet, SensitivePattern};

/// Files that are private wherever they appear, in addition to the private
/// directories.
const PRIVATE_PATH_GLOBS: &[&str] = &[
    "**/CLAUDE.md",
    "**/.claude/**",
    "**/.env.local",
    "**/.env.private",
    "**/__private__*",
    "**/__private__*/**",
    "**/private_*",
    "**/.repokit.yml",
];

const CREDENTIAL_FILENAME_GLOBS: &[&str] = &[
    "*secret*",
    "*credential*",
    "*api_key*",
    "*apikey*",
    "*passwd*",
    "*password*",
    "*private_key*",
    "*.pem",
    "*.key",
    "*.p12",
    "*.pfx",
    "*.env",
    ".env*",
    "id_rsa*",
    "id_dsa*",
    "id_ecdsa*",
    "id_ed25519*",
];

/// Secret material inside file content.
const CREDENTIAL_CONTENT_REGEXES: &[&str] = &[
    r#"(?i)["']?api[_-]?key["']?\s*[:=]\s*["'][^"']+["']"#,
    r#"(?i)["']?secret[_-]?key["']?\s*[:=]\s*["'][^"']+["']"#,
    r#"(?i)["']?password["']?\s*[:=]\s*["'][^"']+["']"#,
    r#"(?i)["']?token["']?\s*[:=]\s*["'][^"']+["']"#,
    r#"(?i)["']?auth["']?\s*[:=]\s*["'][^"']+["']"#,
    r"-----BEGIN (RSA |DSA |EC |OPENSSH )?PRIVATE KEY-----",
    r"ssh-rsa AAAA[0-9A-Za-z+/]+[=]{0,2}",
];

const BACKUP_FILENAME_GLOBS: &[&str] = &[
    "*.tmp",
    "*.log",
    "*.bak",
    "*.backup",
    "*.orig",
    "*.swp",
    "*~",
    "Clipboard Text*",
];

/// Windows device names, with or without an extension.
const RESERVED_NAME_REGEX: &str = r"(?i)^(con|prn|aux|nul|com[1-9]|lpt[1-9])(\..*)?$";

/// The reserved-name pattern on its own.
pub fn reserved_name_pattern() -> SensitivePattern {
    SensitivePattern {
        pattern: RESERVED_NAME_REGEX.to_string(),
        kind: PatternKind::Regex,
        scope: PatternScope::Filename,
        case_sensitive: false,
        set: PatternSet::ReservedName,
    }
}

/// Every built-in pattern, with one `**/<dir>/**` glob per private directory.
pub fn builtin_patterns(private_dirs: &[String]) -> Vec<SensitivePattern> {
    let mut patterns = Vec::new();

    for dir in private_dirs {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            continue;
        }
        patterns.push(SensitivePattern::path_glob(
            &format!("**/{}/**", dir),
            PatternSet::PrivatePath,
        ));
    }
    patterns.extend(
        PRIVATE_PATH_GLOBS
            .iter()
            .map(|p| SensitivePattern::path_glob(p, PatternSet::PrivatePath)),
    );

    patterns.extend(
        CREDENTIAL_FILENAME_GLOBS
            .iter()
            .map(|p| SensitivePattern::filename_glob(p, PatternSet::Credential)),
    );
    patterns.extend(
        CREDENTIAL_CONTENT_REGEXES
            .iter()
            .map(|p| SensitivePattern::content_regex(p, PatternSet::Credential)),
    );

    patterns.extend(
        BACKUP_FILENAME_GLOBS
            .iter()
            .map(|p| SensitivePattern::filename_glob(p, PatternSet::Backup)),
    );

    patterns.push(reserved_name_pattern());
    patterns
}
