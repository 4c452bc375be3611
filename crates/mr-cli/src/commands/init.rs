//! Init command implementation - scaffolds migrun.yml and the group folders

use anyhow::{bail, Context, Result};
use mr_core::config::CONFIG_FILE_NAMES;
use mr_core::{Config, MigrationGroup};
use std::fs;
use std::path::Path;

use crate::cli::{GlobalArgs, InitArgs};

/// Execute the init command
pub(crate) fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let project_dir = Path::new(&global.project_dir);
    let config_path = project_dir.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            config_path.display()
        );
    }

    fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create directory: {}", project_dir.display()))?;

    let name = match &args.name {
        Some(name) => name.clone(),
        None => default_name(project_dir)?,
    };
    if !MigrationGroup::is_valid_name(&name) {
        bail!("Invalid project name '{name}': use letters, digits, and '_' only");
    }

    let mut config = Config::with_defaults(&name);
    if let Some(path) = &global.database {
        config.database.path = path.clone();
    }

    let yaml = serde_yaml::to_string(&config).context("Failed to render configuration")?;
    fs::write(&config_path, yaml)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("  Created {}", CONFIG_FILE_NAMES[0]);

    for group in &config.groups {
        let folder = project_dir.join(&group.path);
        fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create directory: {}", folder.display()))?;
        println!("  Created {}/", group.path);
    }

    println!();
    println!("Project '{name}' initialized.");
    println!();
    println!("Next steps:");
    println!("  Add scripts such as db/init/001_schema.sql");
    println!("  migrun status    # See what would run");
    println!("  migrun run       # Apply pending scripts");

    Ok(())
}

/// Name a project after its directory
fn default_name(project_dir: &Path) -> Result<String> {
    let absolute = project_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", project_dir.display()))?;
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().replace(['-', ' ', '.'], "_"))
        .unwrap_or_else(|| "migrations".to_string());
    Ok(name)
}
