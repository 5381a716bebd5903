//! Serve command: run the HTTP quote server.

use crate::cli::ServeArgs;
use crate::server::{self, AppState};
use anyhow::Result;
use quotes_capital::{Credentials, MarketGateway, SessionManager};
use quotes_config::load_config;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub async fn run(args: ServeArgs, config_path: &Path) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Credentials are resolved once at startup. When absent the server still
    // comes up; every price endpoint then reports the authentication failure.
    let credentials = match Credentials::from_env(&config.capital) {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            warn!("{e}; price endpoints will report authentication failures");
            None
        }
    };

    let session = Arc::new(SessionManager::new(config.capital.clone(), credentials)?);
    let gateway = MarketGateway::new(config.capital.clone(), session)?;
    let state = AppState::new(
        Arc::new(gateway),
        config.watchlist.clone(),
        config.capital.smoke_epic.clone(),
    );

    server::serve(state, &config.server).await
}
