use anyhow::{Context, Result};
use calgrid_core::config::Settings;
use owo_colors::OwoColorize;

pub fn run(settings: &Settings, init: bool) -> Result<()> {
    let config_path = Settings::config_path()?;

    if init {
        if config_path.exists() {
            println!("Config already exists at {}", config_path.display());
        } else {
            Settings::create_default_config(&config_path)?;
            println!("{} {}", "Created".green(), config_path.display());
        }
        return Ok(());
    }

    let status = if config_path.exists() {
        String::new()
    } else {
        " (not created, using defaults)".dimmed().to_string()
    };

    println!("{}", "Paths".bold());
    println!("  Config:  {}{}", config_path.display(), status);
    println!();
    println!("{}", "Effective settings".bold());
    let toml = settings.to_toml().context("Failed to serialize settings")?;
    for line in toml.lines() {
        println!("  {line}");
    }

    Ok(())
}
