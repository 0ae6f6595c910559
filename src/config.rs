//! Configuration module for environment variables and application settings

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use url::Url;

use crate::auth::VerificationMode;

#[derive(Debug, Clone)]
pub struct Config {
    /// Gifting backend that owns accounts, transactions and gift counters
    pub backend: BackendConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Session cookie and verification settings
    pub session: SessionConfig,

    /// Gift-slot display settings
    pub gifts: GiftConfig,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the gateway with credentials
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Cookie lifetime, unrelated to the token's own `exp` claim
    pub cookie_max_age_days: i64,
    pub verification: VerificationMode,
}

#[derive(Debug, Clone)]
pub struct GiftConfig {
    /// Shown when gifts were used but the backend reports no next slot
    pub fallback_cooldown: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_backend = lookup("BACKEND_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string());
        let base_url = parse_base_url(&raw_backend)?;

        let verification = match lookup("SESSION_VERIFICATION").as_deref() {
            None | Some("remote") => VerificationMode::Remote,
            Some("local") => VerificationMode::LocalOnly,
            Some(other) => {
                return Err(anyhow!(
                    "SESSION_VERIFICATION must be `remote` or `local`, got `{}`",
                    other
                ));
            }
        };

        Ok(Self {
            backend: BackendConfig {
                base_url,
                timeout: Duration::from_secs(
                    lookup("BACKEND_TIMEOUT_SECS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(10),
                ),
            },

            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3000),
                cors_origins: lookup("CORS_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:5173".to_string())
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect(),
            },

            session: SessionConfig {
                cookie_name: lookup("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|| "session".to_string()),
                cookie_max_age_days: lookup("SESSION_COOKIE_DAYS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                verification,
            },

            gifts: GiftConfig {
                fallback_cooldown: Duration::from_secs(
                    lookup("GIFT_SLOT_FALLBACK_HOURS")
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(24)
                        * 60
                        * 60,
                ),
            },
        })
    }
}

/// Parse the backend base URL, forcing a trailing slash so that
/// `Url::join` appends endpoint paths instead of replacing the last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let parsed = Url::parse(&normalized).context("Failed to parse BACKEND_URL")?;
    tracing::debug!("Parsed backend URL: {}", parsed);

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("Invalid BACKEND_URL scheme, expected http or https");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.backend.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.cookie_name, "session");
        assert_eq!(config.session.cookie_max_age_days, 30);
        assert_eq!(config.session.verification, VerificationMode::Remote);
        assert_eq!(config.gifts.fallback_cooldown, Duration::from_secs(24 * 3600));
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn backend_url_keeps_path_prefix() {
        let config = config_with(&[("BACKEND_URL", "https://api.example.com/v1")]).unwrap();
        let joined = config.backend.base_url.join("protected").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/v1/protected");
    }

    #[test]
    fn rejects_unknown_verification_mode() {
        assert!(config_with(&[("SESSION_VERIFICATION", "maybe")]).is_err());
    }

    #[test]
    fn rejects_non_http_backend() {
        assert!(config_with(&[("BACKEND_URL", "postgres://localhost/db")]).is_err());
    }

    #[test]
    fn parses_overrides() {
        let config = config_with(&[
            ("SESSION_VERIFICATION", "local"),
            ("GIFT_SLOT_FALLBACK_HOURS", "12"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("PORT", "8081"),
        ])
        .unwrap();
        assert_eq!(config.session.verification, VerificationMode::LocalOnly);
        assert_eq!(config.gifts.fallback_cooldown, Duration::from_secs(12 * 3600));
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.server.port, 8081);
    }
}
