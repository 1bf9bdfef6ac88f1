//! Firebase project configuration.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default Identity Toolkit endpoint.
pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
/// Default Firestore endpoint.
pub const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to an unusable value.
    #[error("invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Firebase project settings, read from `FIREBASE_*` variables.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Web API key (`FIREBASE_API_KEY`).
    pub api_key: String,
    /// Auth domain (`FIREBASE_AUTH_DOMAIN`).
    pub auth_domain: String,
    /// Project id (`FIREBASE_PROJECT_ID`).
    pub project_id: String,
    /// Storage bucket (`FIREBASE_STORAGE_BUCKET`).
    pub storage_bucket: String,
    /// Messaging sender id (`FIREBASE_MESSAGING_SENDER_ID`).
    pub messaging_sender_id: String,
    /// App id (`FIREBASE_APP_ID`).
    pub app_id: String,
    /// Analytics measurement id (`FIREBASE_MEASUREMENT_ID`), optional.
    pub measurement_id: Option<String>,
    /// Identity Toolkit base URL (`FIREBASE_IDENTITY_ENDPOINT`), for emulators.
    pub identity_endpoint: String,
    /// Firestore base URL (`FIREBASE_FIRESTORE_ENDPOINT`), for emulators.
    pub firestore_endpoint: String,
    /// Per-request HTTP timeout (`FIREBASE_HTTP_TIMEOUT_SECS`, default 10).
    pub http_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("measurement_id", &self.measurement_id)
            .field("identity_endpoint", &self.identity_endpoint)
            .field("firestore_endpoint", &self.firestore_endpoint)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Read from the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] for an unset required variable,
    /// [`ConfigError::Invalid`] for an unparsable timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// As for [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let http_timeout = match optional("FIREBASE_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "FIREBASE_HTTP_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(10),
        };

        Ok(Self {
            api_key: required("FIREBASE_API_KEY")?,
            auth_domain: required("FIREBASE_AUTH_DOMAIN")?,
            project_id: required("FIREBASE_PROJECT_ID")?,
            storage_bucket: required("FIREBASE_STORAGE_BUCKET")?,
            messaging_sender_id: required("FIREBASE_MESSAGING_SENDER_ID")?,
            app_id: required("FIREBASE_APP_ID")?,
            measurement_id: optional("FIREBASE_MEASUREMENT_ID"),
            identity_endpoint: optional("FIREBASE_IDENTITY_ENDPOINT")
                .unwrap_or_else(|| IDENTITY_TOOLKIT_URL.to_string()),
            firestore_endpoint: optional("FIREBASE_FIRESTORE_ENDPOINT")
                .unwrap_or_else(|| FIRESTORE_URL.to_string()),
            http_timeout,
        })
    }

    /// Root of the project's default database documents.
    #[must_use]
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_endpoint.trim_end_matches('/'),
            self.project_id
        )
    }

    /// Identity Toolkit method URL, e.g. `accounts:signUp`.
    #[must_use]
    pub fn identity_url(&self, method: &str) -> String {
        format!("{}/{method}", self.identity_endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("FIREBASE_API_KEY", "key-123"),
            ("FIREBASE_AUTH_DOMAIN", "spelthorne-vc.firebaseapp.com"),
            ("FIREBASE_PROJECT_ID", "spelthorne-vc"),
            ("FIREBASE_STORAGE_BUCKET", "spelthorne-vc.appspot.com"),
            ("FIREBASE_MESSAGING_SENDER_ID", "4242"),
            ("FIREBASE_APP_ID", "1:4242:web:abc"),
        ])
    }

    fn lookup<'a>(
        vars: &'a HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| vars.get(name).map(ToString::to_string)
    }

    #[test]
    fn reads_required_and_defaults() {
        let env = vars();
        let config = ProviderConfig::from_lookup(lookup(&env)).unwrap();
        assert_eq!(config.project_id, "spelthorne-vc");
        assert_eq!(config.measurement_id, None);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(
            config.documents_url(),
            "https://firestore.googleapis.com/v1/projects/spelthorne-vc/databases/(default)/documents"
        );
        assert_eq!(
            config.identity_url("accounts:signUp"),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp"
        );
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let mut env = vars();
        env.remove("FIREBASE_APP_ID");
        assert_eq!(
            ProviderConfig::from_lookup(lookup(&env)),
            Err(ConfigError::Missing("FIREBASE_APP_ID"))
        );
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = vars();
        env.insert("FIREBASE_API_KEY", "  ");
        assert_eq!(
            ProviderConfig::from_lookup(lookup(&env)),
            Err(ConfigError::Missing("FIREBASE_API_KEY"))
        );
    }

    #[test]
    fn endpoint_overrides_for_emulators() {
        let mut env = vars();
        env.insert("FIREBASE_FIRESTORE_ENDPOINT", "http://localhost:8080/v1/");
        env.insert("FIREBASE_MEASUREMENT_ID", "G-XYZ");
        let config = ProviderConfig::from_lookup(lookup(&env)).unwrap();
        assert!(config.documents_url().starts_with("http://localhost:8080/v1/projects/"));
        assert_eq!(config.measurement_id.as_deref(), Some("G-XYZ"));
    }

    #[test]
    fn debug_hides_api_key() {
        let env = vars();
        let config = ProviderConfig::from_lookup(lookup(&env)).unwrap();
        assert!(!format!("{config:?}").contains("key-123"));
    }
}
