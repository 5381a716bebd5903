//! Search command: ad hoc epic discovery from the terminal.

use crate::cli::SearchArgs;
use anyhow::Result;
use quotes_capital::{Credentials, MarketGateway, SessionManager};
use quotes_config::load_config;
use quotes_core::QuoteSource;
use std::path::Path;
use std::sync::Arc;

pub async fn run(args: SearchArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let credentials = Credentials::from_env(&config.capital)?;
    let session = Arc::new(SessionManager::new(
        config.capital.clone(),
        Some(credentials),
    )?);
    let gateway = MarketGateway::new(config.capital.clone(), session)?;

    let hits = gateway.search(&args.term, args.limit).await?;
    if hits.is_empty() {
        println!("No instruments matched {:?}", args.term);
        return Ok(());
    }

    for hit in &hits {
        println!("{:<24} {:<18} {}", hit.epic, hit.instrument_type, hit.name);
    }

    Ok(())
}
