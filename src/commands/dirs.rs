//! Implementation of the `repokit dirs` and `repokit config` commands.

use crate::cli::SelectionArgs;
use crate::config::Config;
use crate::directories::DirectoryCatalog;
use crate::error::Result;
use std::path::Path;

/// Print the directories a selection resolves to, private ones marked.
///
/// Pure: reads configuration only and touches nothing on disk.
pub fn cmd_dirs(cwd: &Path, args: SelectionArgs) -> Result<()> {
    let config = Config::load_layered(cwd, &args.to_overrides()?)?;
    let (resolved, private) = DirectoryCatalog::from_config(&config).resolve_config(&config)?;

    println!("Directories ({}):", resolved.len());
    for dir in resolved.iter() {
        println!("  {}", dir);
    }
    println!();
    println!("Private set ({}):", private.selector.as_str());
    for dir in &private.directories {
        println!("  {}", dir);
    }
    Ok(())
}

/// Print the merged configuration as YAML.
pub fn cmd_config(cwd: &Path, args: SelectionArgs) -> Result<()> {
    let config = Config::load_layered(cwd, &args.to_overrides()?)?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
