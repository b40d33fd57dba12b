//! Config command - prints the effective configuration

use anyhow::{Context, Result};
use ember_player::PlayOptions;

pub fn run(options: PlayOptions) -> Result<()> {
    let config = options.resolve()?;
    let toml = config
        .to_toml_string()
        .context("Failed to serialize config")?;
    print!("{toml}");
    Ok(())
}
