//! Configuration structures.

use quotes_core::{Watchlist, WatchlistEntry};
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub capital: CapitalSettings,
    #[serde(default = "default_watchlist")]
    pub watchlist: Watchlist,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            logging: LoggingConfig::default(),
            server: ServerSettings::default(),
            capital: CapitalSettings::default(),
            watchlist: default_watchlist(),
        }
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "quote-proxy".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// HTTP serving settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Capital.com API settings.
///
/// Secrets never live in the configuration file; only the names of the
/// environment variables that hold them do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalSettings {
    pub base_url: String,
    /// Bound on every outbound call so a stalled upstream cannot hang the
    /// serving layer.
    pub timeout_secs: u64,
    /// Venue suffix assumed for bare tickers ("GS" -> "GS.US").
    pub default_venue: String,
    /// Always-open instrument used by the connectivity smoke test.
    pub smoke_epic: String,
    pub email_env: String,
    pub api_key_env: String,
    pub password_env: String,
}

impl Default for CapitalSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api-capital.backend-capital.com/api/v1".to_string(),
            timeout_secs: 10,
            default_venue: "US".to_string(),
            smoke_epic: "BTCUSD".to_string(),
            email_env: "CAPITAL_EMAIL".to_string(),
            api_key_env: "CAPITAL_API_KEY".to_string(),
            password_env: "CAPITAL_PASSWORD".to_string(),
        }
    }
}

fn default_watchlist() -> Watchlist {
    Watchlist::new(vec![
        WatchlistEntry::new("Goldman_Sachs", "GS.US"),
        WatchlistEntry::new("UnitedHealth", "UNH.US"),
        WatchlistEntry::new("Caterpillar", "CAT.US"),
        WatchlistEntry::new("US30", "US30"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_watchlist_has_the_elite_four() {
        let config = AppConfig::default();
        assert_eq!(config.watchlist.len(), 4);
        assert_eq!(config.watchlist.entries[0].name, "Goldman_Sachs");
        assert_eq!(config.watchlist.entries[0].epic, "GS.US");
    }

    #[test]
    fn defaults_point_at_the_live_api() {
        let capital = CapitalSettings::default();
        assert!(capital.base_url.starts_with("https://api-capital"));
        assert_eq!(capital.timeout_secs, 10);
        assert_eq!(capital.smoke_epic, "BTCUSD");
    }
}
