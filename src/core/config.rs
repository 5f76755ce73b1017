//! Runtime configuration loaded from environment variables
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add locale configuration and modules directory override
//! - 1.0.0: Initial creation

use anyhow::{anyhow, Result};

/// Runtime configuration for the bot process.
///
/// All values come from environment variables (optionally via a `.env`
/// file loaded by the binary). Only `DISCORD_TOKEN` is required.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token (required)
    pub discord_token: String,
    /// Guild IDs commands should be restricted to during development
    pub guild_ids: Vec<String>,
    /// Root directory scanned for handler module manifests
    pub modules_dir: String,
    /// Directory holding one YAML translation file per locale
    pub locales_dir: String,
    /// Base locale used for canonical command names/descriptions
    pub default_locale: String,
    /// Path to the sqlite database file
    pub database_path: String,
    /// Log level filter passed to env_logger
    pub log_level: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow!("DISCORD_TOKEN environment variable is required"))?;

        // Comma-separated list; whitespace around entries is tolerated.
        let guild_ids = std::env::var("GUILD_IDS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            discord_token,
            guild_ids,
            modules_dir: std::env::var("MODULES_DIR").unwrap_or_else(|_| "modules".to_string()),
            locales_dir: std::env::var("LOCALES_DIR").unwrap_or_else(|_| "locales".to_string()),
            default_locale: std::env::var("DEFAULT_LOCALE")
                .unwrap_or_else(|_| "en-US".to_string()),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "relay.db".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so parallel test runs never race on the env vars.
    #[test]
    fn test_from_env() {
        std::env::remove_var("DISCORD_TOKEN");
        assert!(Config::from_env().is_err());

        std::env::set_var("DISCORD_TOKEN", "test-token");
        std::env::set_var("GUILD_IDS", "123456789012345678, 234567890123456789,");
        std::env::remove_var("MODULES_DIR");

        let config = Config::from_env().unwrap();
        assert_eq!(config.modules_dir, "modules");
        assert_eq!(config.default_locale, "en-US");
        assert_eq!(config.guild_ids.len(), 2);

        std::env::remove_var("DISCORD_TOKEN");
        std::env::remove_var("GUILD_IDS");
    }
}
