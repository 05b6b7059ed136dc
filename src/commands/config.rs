use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use dao_treasury::Settings;

use super::CliError;

/// Show effective settings
pub fn show(settings: &Settings, source: Option<&Path>) -> Result<()> {
    println!("{}", "DAO Treasury Configuration".bright_cyan().bold());
    match source {
        Some(path) => println!("  Source: {}", path.display().to_string().dimmed()),
        None => println!("  Source: {}", "built-in defaults".dimmed()),
    }
    println!();
    println!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

/// Write default settings to `path`
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.to_path_buf()).into());
    }
    Settings::default().to_file(path)?;
    println!(
        "{} Default configuration written to {}",
        "✓".bright_green(),
        path.display().to_string().bright_yellow()
    );
    Ok(())
}
