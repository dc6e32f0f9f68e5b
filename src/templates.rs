//! Template rendering seam.
//!
//! A `TemplateRenderer` produces starter files for a new repository. Its
//! output is written into the main working copy and committed on the private
//! branch like any other file, so it passes through the guard and is filtered
//! out of public branches by the same patterns.

use crate::error::{RepokitError, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::Path;

/// What the renderer knows about the project being created.
#[derive(Debug, Clone, Default)]
pub struct ProjectDescriptor {
    pub name: String,
    pub description: String,
    /// Resolved directories, in creation order.
    pub directories: Vec<String>,
}

impl ProjectDescriptor {
    /// Substitution variables available to templates.
    pub fn variables(&self) -> BTreeMap<&'static str, String> {
        let layout = self
            .directories
            .iter()
            .map(|d| format!("- `{}/`", d))
            .collect::<Vec<_>>()
            .join("\n");
        BTreeMap::from([
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("layout", layout),
        ])
    }
}

/// One file produced by a renderer, relative to the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: String,
    pub contents: String,
}

pub trait TemplateRenderer {
    /// Render the files for `descriptor` into `dir`.
    ///
    /// Implementations return the files instead of writing them; the caller
    /// decides which to write and records what it created.
    fn render(&self, dir: &Path, descriptor: &ProjectDescriptor) -> Result<Vec<RenderedFile>>;
}

/// Replace `${var}` placeholders. Unknown placeholders are left as written.
pub fn substitute(template: &str, vars: &BTreeMap<&'static str, String>) -> Result<String> {
    let placeholder = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| RepokitError::UserError(format!("invalid placeholder pattern: {}", e)))?;
    Ok(placeholder
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned())
}

const README_TEMPLATE: &str = "# ${name}\n\n${description}\n\n## Layout\n\n${layout}\n";

const GITIGNORE_TEMPLATE: &str = "\
# Build output
target/
build/
dist/

# Editors and OS
.DS_Store
*.swp
*~
.idea/
.vscode/

# Scratch files
*.tmp
*.bak
*.orig
";

/// README and `.gitignore` starter files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl TemplateRenderer for BuiltinTemplates {
    fn render(&self, dir: &Path, descriptor: &ProjectDescriptor) -> Result<Vec<RenderedFile>> {
        let vars = descriptor.variables();
        let files = [("README.md", README_TEMPLATE), (".gitignore", GITIGNORE_TEMPLATE)];

        files
            .into_iter()
            .filter(|(path, _)| !dir.join(path).exists())
            .map(|(path, template)| {
                Ok(RenderedFile {
                    path: path.to_string(),
                    contents: substitute(template, &vars)?,
                })
            })
            .collect()
    }
}
