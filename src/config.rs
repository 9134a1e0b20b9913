use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    audio::SessionSettings,
    sources::{youtube::parse_search_order, SearchStrategy},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Búsqueda
    pub youtube_api_key: Option<String>,
    pub search_order: Vec<SearchStrategy>,
    pub resolve_timeout_secs: u64,

    // Sesiones
    pub idle_timeout_secs: u64,
    pub progress_interval_ms: u64,
    pub max_queue_size: usize,

    // Audio
    pub default_volume: f32,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN no definido")?,
            command_prefix: std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!".to_string()),

            // Búsqueda
            youtube_api_key: std::env::var("YOUTUBE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            search_order: parse_search_order(
                &std::env::var("SEARCH_ORDER").unwrap_or_else(|_| "api,ytdlp".to_string()),
            )?,
            resolve_timeout_secs: std::env::var("RESOLVE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,

            // Sesiones
            idle_timeout_secs: std::env::var("IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "180".to_string()) // 3 minutos
                .parse()?,
            progress_interval_ms: std::env::var("PROGRESS_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,

            // Audio
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// - Token and prefix must not be empty
    /// - Volume must be between 0.0 and 2.0
    /// - Timeouts, the progress cadence and the queue limit must be greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN cannot be empty");
        }

        if self.command_prefix.trim().is_empty() {
            anyhow::bail!("Command prefix cannot be empty");
        }

        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!("Default volume must be between 0.0 and 2.0, got: {}", self.default_volume);
        }

        if self.idle_timeout_secs == 0 {
            anyhow::bail!("Idle timeout must be greater than 0");
        }

        // Menos de 250ms choca con el rate limit de edición de Discord
        if self.progress_interval_ms < 250 {
            anyhow::bail!("Progress interval must be at least 250ms, got: {}", self.progress_interval_ms);
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.resolve_timeout_secs == 0 {
            anyhow::bail!("Resolve timeout must be greater than 0");
        }

        if self.search_order.is_empty() {
            anyhow::bail!("Search order cannot be empty");
        }

        Ok(())
    }

    /// Políticas de sesión derivadas de la configuración
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            max_queue_size: self.max_queue_size,
        }
    }

    /// Returns a summary of the current configuration for logging (never includes secrets).
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Commands: prefix '{}'\n  \
            Search: {:?} (API key: {}), {}s resolve timeout\n  \
            Sessions: {}s idle, {}ms progress, {} max queue\n  \
            Audio: {}% vol",
            self.command_prefix,
            self.search_order,
            if self.youtube_api_key.is_some() { "yes" } else { "no" },
            self.resolve_timeout_secs,
            self.idle_timeout_secs,
            self.progress_interval_ms,
            self.max_queue_size,
            (self.default_volume * 100.0) as u32,
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (el token no tiene valor por defecto)
            discord_token: String::new(),
            command_prefix: "!".to_string(),

            youtube_api_key: None,
            search_order: vec![SearchStrategy::Api, SearchStrategy::YtDlp],
            resolve_timeout_secs: 60,

            idle_timeout_secs: 180,
            progress_interval_ms: 1000,
            max_queue_size: 1000,

            default_volume: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid() -> Config {
        Config {
            discord_token: "token".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults_are_valid_once_token_is_set() {
        assert!(Config::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let volume = Config { default_volume: 3.0, ..valid() };
        let idle = Config { idle_timeout_secs: 0, ..valid() };
        let cadence = Config { progress_interval_ms: 10, ..valid() };
        let queue = Config { max_queue_size: 0, ..valid() };

        for config in [volume, idle, cadence, queue] {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_session_settings_follow_config() {
        let config = Config {
            idle_timeout_secs: 60,
            progress_interval_ms: 2000,
            max_queue_size: 5,
            ..valid()
        };
        let settings = config.session_settings();

        assert_eq!(settings.idle_timeout, Duration::from_secs(60));
        assert_eq!(settings.progress_interval, Duration::from_secs(2));
        assert_eq!(settings.max_queue_size, 5);
    }

    #[test]
    fn test_summary_hides_secrets() {
        let config = Config {
            youtube_api_key: Some("secret-key".to_string()),
            ..valid()
        };
        let summary = config.summary();

        assert!(!summary.contains("token"));
        assert!(!summary.contains("secret-key"));
        assert!(summary.contains("API key: yes"));
    }
}
