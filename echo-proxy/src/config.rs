//! Proxy configuration
//!
//! Settings resolve CLI → ENV → TOML → default (see `echo_common::config`).
//! Credentials are optional: a missing one disables the feature that needs
//! it and is reported at startup, it never stops the server.

use clap::Parser;
use echo_common::config::{resolve_setting, TomlConfig, DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::services::ClientCredentials;

pub const ENV_HOST: &str = "ECHO_HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_AUDD_API_TOKEN: &str = "AUDD_API_TOKEN";
pub const ENV_OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";

/// Command-line arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "echo-proxy", version, about = "ECHO backend proxy")]
pub struct ProxyArgs {
    /// TOML config file (default: ~/.config/echo/config.toml)
    #[arg(long, env = "ECHO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub spotify_client_id: Option<String>,

    #[arg(long)]
    pub spotify_client_secret: Option<String>,

    #[arg(long)]
    pub audd_api_token: Option<String>,
}

/// Fully resolved proxy configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub spotify: Option<ClientCredentials>,
    pub audd_api_token: Option<String>,
    /// Only reported; the weather lookup runs client side
    pub openweather_api_key: Option<String>,
}

impl ProxyConfig {
    pub fn resolve(args: &ProxyArgs, toml: &TomlConfig) -> Self {
        let creds = &toml.credentials;

        let host = resolve_setting(args.host.as_deref(), ENV_HOST, toml.proxy.host.as_deref())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = args
            .port
            .or_else(|| match std::env::var(ENV_PORT) {
                Ok(raw) => match raw.trim().parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("Ignoring invalid {}={:?}", ENV_PORT, raw);
                        None
                    }
                },
                Err(_) => None,
            })
            .or(toml.proxy.port)
            .unwrap_or(DEFAULT_PORT);

        let client_id = resolve_setting(
            args.spotify_client_id.as_deref(),
            ENV_SPOTIFY_CLIENT_ID,
            creds.spotify_client_id.as_deref(),
        );
        let client_secret = resolve_setting(
            args.spotify_client_secret.as_deref(),
            ENV_SPOTIFY_CLIENT_SECRET,
            creds.spotify_client_secret.as_deref(),
        );
        let spotify = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let audd_api_token = resolve_setting(
            args.audd_api_token.as_deref(),
            ENV_AUDD_API_TOKEN,
            creds.audd_api_token.as_deref(),
        );
        let openweather_api_key = resolve_setting(
            None,
            ENV_OPENWEATHER_API_KEY,
            creds.openweather_api_key.as_deref(),
        );

        Self {
            host,
            port,
            spotify,
            audd_api_token,
            openweather_api_key,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log which credentials were found; true when all are present
    pub fn report_credentials(&self) -> bool {
        let checks = [
            ("Catalog client id/secret", self.spotify.is_some()),
            ("Recognition API token", self.audd_api_token.is_some()),
            ("Weather API key", self.openweather_api_key.is_some()),
        ];

        let mut all_loaded = true;
        for (name, present) in checks {
            if present {
                info!("✓ {}: loaded", name);
            } else {
                error!("✗ {}: missing", name);
                all_loaded = false;
            }
        }

        if all_loaded {
            info!("All credentials loaded");
        } else {
            warn!("Some credentials are missing; the features that need them are disabled");
        }
        all_loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echo_common::config::CredentialsSection;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            ENV_HOST,
            ENV_PORT,
            ENV_SPOTIFY_CLIENT_ID,
            ENV_SPOTIFY_CLIENT_SECRET,
            ENV_AUDD_API_TOKEN,
            ENV_OPENWEATHER_API_KEY,
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_any_source() {
        clear_env();

        let config = ProxyConfig::resolve(&ProxyArgs::default(), &TomlConfig::default());

        assert_eq!(config.bind_address(), "127.0.0.1:3001");
        assert!(config.spotify.is_none());
        assert!(config.audd_api_token.is_none());
        assert!(!config.report_credentials());
    }

    #[test]
    #[serial]
    fn test_half_credentials_disable_catalog() {
        clear_env();
        std::env::set_var(ENV_SPOTIFY_CLIENT_ID, "id-only");

        let config = ProxyConfig::resolve(&ProxyArgs::default(), &TomlConfig::default());

        assert!(config.spotify.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_tiers_combine() {
        clear_env();
        std::env::set_var(ENV_PORT, "8080");
        std::env::set_var(ENV_SPOTIFY_CLIENT_SECRET, "env-secret");

        let toml = TomlConfig {
            credentials: CredentialsSection {
                spotify_client_id: Some("toml-id".to_string()),
                spotify_client_secret: Some("toml-secret".to_string()),
                audd_api_token: Some("toml-audd".to_string()),
                openweather_api_key: None,
            },
            ..Default::default()
        };
        let args = ProxyArgs {
            audd_api_token: Some("cli-audd".to_string()),
            ..Default::default()
        };

        let config = ProxyConfig::resolve(&args, &toml);

        assert_eq!(config.port, 8080);
        let spotify = config.spotify.unwrap();
        assert_eq!(spotify.client_id, "toml-id");
        assert_eq!(spotify.client_secret, "env-secret");
        assert_eq!(config.audd_api_token.as_deref(), Some("cli-audd"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_env_falls_through() {
        clear_env();
        std::env::set_var(ENV_PORT, "not-a-port");

        let config = ProxyConfig::resolve(&ProxyArgs::default(), &TomlConfig::default());

        assert_eq!(config.port, DEFAULT_PORT);
        clear_env();
    }
}
