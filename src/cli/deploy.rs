//! Deploy command - trigger the configured preview deploy hook

use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use draftsmith::config::AppConfig;
use draftsmith::deploy::trigger_hook;
use draftsmith::error::{Error, Result};

/// Run the deploy command
pub async fn run_deploy() -> Result<()> {
    let config = AppConfig::load()?;
    let response = trigger_hook(config.deploy.hook_url.as_deref()).await?;

    if response.ok {
        println!("{} Deploy hook accepted ({})", check(), response.status);
    } else {
        println!("{} Deploy hook answered {}", cross(), response.status);
    }
    if !response.text.trim().is_empty() {
        println!("{}", response.text.trim().muted());
    }

    if response.ok {
        Ok(())
    } else {
        Err(Error::Deploy(format!(
            "hook responded with status {}",
            response.status
        )))
    }
}
