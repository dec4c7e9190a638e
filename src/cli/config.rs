//! Config command - inspect the configuration file

use anstream::{print, println};
use draftsmith::config::{AppConfig, config_path};
use draftsmith::error::{Error, Result};

/// Print the config file location
pub fn run_config_path() -> Result<()> {
    let path = config_path()
        .ok_or_else(|| Error::Config("no configuration directory on this platform".to_string()))?;
    println!("{}", path.display());
    Ok(())
}

/// Print the effective configuration, file plus environment overrides
pub fn run_config_show() -> Result<()> {
    let config = AppConfig::load()?;
    print!("{}", config.to_display_toml()?);
    Ok(())
}
