//! Server configuration loaded from environment variables.

use clubhouse_portal::PortalSettings;
use clubhouse_portal::firebase::{ConfigError, ProviderConfig};
use std::time::Duration;

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase project settings.
    pub provider: ProviderConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Per-client portal tunables.
    pub portal: PortalSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Whole-request timeout applied by the router
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info,clubhouse=debug".to_string(),
            shutdown_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl ServerConfig {
    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a required `FIREBASE_*` variable is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    ///
    /// Unparsable numeric values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a required `FIREBASE_*` variable is missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = ProviderConfig::from_lookup(&lookup)?;
        let number = |name: &str| lookup(name).and_then(|s| s.trim().parse::<u64>().ok());
        let defaults = ServerConfig::default();
        let portal_defaults = PortalSettings::default();

        let server = ServerConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            shutdown_timeout: number("SHUTDOWN_TIMEOUT")
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
            request_timeout: number("REQUEST_TIMEOUT")
                .map_or(defaults.request_timeout, Duration::from_secs),
        };

        // 0 keeps banners until dismissed
        let banner_ttl = match number("BANNER_TTL_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => portal_defaults.banner_ttl,
        };

        // Leave headroom so the store wait fails before the router's timeout.
        let request_timeout = server
            .request_timeout
            .saturating_sub(Duration::from_secs(1))
            .max(Duration::from_secs(1));

        Ok(Self {
            provider,
            server,
            portal: PortalSettings {
                banner_ttl,
                request_timeout,
                ..portal_defaults
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(extra: &[(&'static str, &'static str)]) -> Config {
        let mut vars: HashMap<&str, &str> = HashMap::from([
            ("FIREBASE_API_KEY", "key"),
            ("FIREBASE_AUTH_DOMAIN", "club.firebaseapp.com"),
            ("FIREBASE_PROJECT_ID", "club"),
            ("FIREBASE_STORAGE_BUCKET", "club.appspot.com"),
            ("FIREBASE_MESSAGING_SENDER_ID", "1"),
            ("FIREBASE_APP_ID", "1:1:web:1"),
        ]);
        vars.extend(extra.iter().copied());
        Config::from_lookup(|name| vars.get(name).map(ToString::to_string)).unwrap()
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[]);
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.portal.banner_ttl, Some(Duration::from_secs(6)));
        assert!(config.portal.request_timeout < config.server.request_timeout);
    }

    #[test]
    fn overrides_and_bad_numbers() {
        let config = load(&[("PORT", "3000"), ("SHUTDOWN_TIMEOUT", "soon"), ("BANNER_TTL_SECS", "0")]);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.portal.banner_ttl, None);
    }

    #[test]
    fn missing_provider_settings_fail() {
        let result = Config::from_lookup(|_| None);
        assert_eq!(
            result.map(|_| ()),
            Err(ConfigError::Missing("FIREBASE_API_KEY"))
        );
    }
}
