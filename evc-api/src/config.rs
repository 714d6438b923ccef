//! Runtime settings for the HTTP service
//!
//! Credentials and endpoints resolve with environment variables ahead of the
//! TOML file. Server bind settings resolve CLI, then TOML, then compiled defaults
//! (clap already folds `EVC_HOST`/`EVC_PORT` into the CLI tier).

use evc_common::config::{ComposioConfig, ServerConfig};
use std::time::Duration;
use tracing::{info, warn};

pub const API_KEY_ENV: &str = "COMPOSIO_API_KEY";
pub const BASE_URL_ENV: &str = "COMPOSIO_BASE_URL";
pub const USER_ID_ENV: &str = "COMPOSIO_USER_ID";

/// Everything the live event source needs
#[derive(Debug, Clone, PartialEq)]
pub struct ComposioSettings {
    /// `None` selects the demo catalog
    pub api_key: Option<String>,
    pub base_url: String,
    pub user_id: Option<String>,
    pub timeout: Duration,
}

impl ComposioSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the tool-execution API key
///
/// Priority: environment, then TOML. Returns `None` when neither holds a
/// usable key.
pub fn resolve_composio_api_key(config: &ComposioConfig) -> Option<String> {
    let mut sources = Vec::new();

    let env_key = std::env::var(API_KEY_ENV).ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    let toml_key = config.api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    if sources.len() > 1 {
        warn!(
            "Composio API key found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("Composio API key loaded from environment variable");
            return Some(key);
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("Composio API key loaded from TOML config");
            return Some(key.clone());
        }
    }

    None
}

pub fn resolve_composio_settings(config: &ComposioConfig) -> ComposioSettings {
    ComposioSettings {
        api_key: resolve_composio_api_key(config),
        base_url: env_value(BASE_URL_ENV).unwrap_or_else(|| config.base_url.clone()),
        user_id: env_value(USER_ID_ENV).or_else(|| config.user_id.clone()),
        timeout: Duration::from_secs(config.timeout_secs.max(1)),
    }
}

/// Bind address from CLI/env overrides and the TOML `[server]` table
pub fn resolve_bind_address(
    cli_host: Option<String>,
    cli_port: Option<u16>,
    server: &ServerConfig,
) -> (String, u16) {
    (
        cli_host.unwrap_or_else(|| server.host.clone()),
        cli_port.unwrap_or(server.port),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        env::remove_var(API_KEY_ENV);
        env::remove_var(BASE_URL_ENV);
        env::remove_var(USER_ID_ENV);
    }

    #[test]
    #[serial]
    fn test_env_key_wins_over_toml() {
        clear_env();
        env::set_var(API_KEY_ENV, "env-key");
        let config = ComposioConfig {
            api_key: Some("toml-key".to_string()),
            ..Default::default()
        };

        assert_eq!(resolve_composio_api_key(&config).as_deref(), Some("env-key"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_toml_key_used_when_env_blank() {
        clear_env();
        env::set_var(API_KEY_ENV, "  ");
        let config = ComposioConfig {
            api_key: Some("toml-key".to_string()),
            ..Default::default()
        };

        assert_eq!(resolve_composio_api_key(&config).as_deref(), Some("toml-key"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_no_key_means_unconfigured() {
        clear_env();
        let settings = resolve_composio_settings(&ComposioConfig::default());

        assert!(!settings.is_configured());
        assert_eq!(
            settings.base_url,
            evc_common::config::DEFAULT_COMPOSIO_BASE_URL
        );
        assert_eq!(settings.timeout, Duration::from_secs(15));
    }

    #[test]
    #[serial]
    fn test_env_overrides_endpoint_and_user() {
        clear_env();
        env::set_var(BASE_URL_ENV, "http://localhost:9999/api");
        env::set_var(USER_ID_ENV, "someone");
        let config = ComposioConfig {
            user_id: Some("toml-user".to_string()),
            ..Default::default()
        };

        let settings = resolve_composio_settings(&config);
        assert_eq!(settings.base_url, "http://localhost:9999/api");
        assert_eq!(settings.user_id.as_deref(), Some("someone"));
        clear_env();
    }

    #[test]
    fn test_bind_address_priority() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };

        assert_eq!(
            resolve_bind_address(None, None, &server),
            ("0.0.0.0".to_string(), 8080)
        );
        assert_eq!(
            resolve_bind_address(Some("127.0.0.1".to_string()), Some(3001), &server),
            ("127.0.0.1".to_string(), 3001)
        );
    }
}
