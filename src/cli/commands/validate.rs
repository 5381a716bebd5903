//! Validate configuration command.

use anyhow::Result;
use quotes_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Server: {}:{}", config.server.host, config.server.port);
            println!("Capital base URL: {}", config.capital.base_url);
            println!("Request timeout: {}s", config.capital.timeout_secs);
            println!("Smoke-test epic: {}", config.capital.smoke_epic);
            println!("Watch-list entries: {}", config.watchlist.len());
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
