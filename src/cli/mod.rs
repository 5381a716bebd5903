//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quote-proxy")]
#[command(author, version, about = "Capital.com market data proxy")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP quote server
    Serve(ServeArgs),
    /// Discover instrument epics by free-text search
    Search(SearchArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Bind host (overrides configuration)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides configuration)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Search term, e.g. "Microsoft"
    pub term: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,
}
