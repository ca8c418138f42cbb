//! Connection configuration: TOML deserialization, env fallbacks and validation.
//!
//! ```toml
//! [looker]
//! base_url = "https://example.cloud.looker.com"
//! client_id = "${LOOKERSDK_CLIENT_ID}"
//! client_secret = "${LOOKERSDK_CLIENT_SECRET}"
//! verify_ssl = true
//! timeout_secs = 120
//! ```
//!
//! Any field left out of the file falls back to the matching `LOOKERSDK_*`
//! environment variable.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::client::auth::Credentials;
use crate::error::BindingError;

pub const ENV_BASE_URL: &str = "LOOKERSDK_BASE_URL";
pub const ENV_CLIENT_ID: &str = "LOOKERSDK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "LOOKERSDK_CLIENT_SECRET";
pub const ENV_VERIFY_SSL: &str = "LOOKERSDK_VERIFY_SSL";
pub const ENV_TIMEOUT: &str = "LOOKERSDK_TIMEOUT";

/// Only API 4.0 is supported.
pub const API_VERSION: &str = "4.0";

fn default_timeout_secs() -> u64 {
    120
}

/// Strip an env var reference to its variable name.
///
/// Accepts `${VAR_NAME}` syntax only. Returns `None` if the value is not a
/// valid env-var reference.
pub fn parse_env_ref(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|s| s.strip_suffix('}'))
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BindingsConfig {
    #[serde(default)]
    pub looker: LookerConfig,
}

/// The `[looker]` table. Every field is optional in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookerConfig {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    /// Must be a `${VAR}` reference when set in the file.
    pub client_secret: Option<String>,
    pub verify_ssl: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings the API client is built from.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Instance URL without a trailing slash, e.g. `https://example.cloud.looker.com`.
    pub base_url: String,
    pub credentials: Credentials,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

impl ClientSettings {
    /// Root of the versioned API, e.g. `https://host/api/4.0`.
    pub fn api_url(&self) -> String {
        format!("{}/api/{}", self.base_url, API_VERSION)
    }
}

impl BindingsConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BindingError::InvalidConfig(path.display().to_string(), e.to_string())
        })?;
        toml::from_str(&content)
            .map_err(|e| BindingError::InvalidConfig(path.display().to_string(), e.to_string()))
    }

    /// Validate the file contents before any env resolution.
    pub fn validate(&self) -> crate::Result<()> {
        let looker = &self.looker;

        if let Some(secret) = &looker.client_secret {
            if parse_env_ref(secret).is_none() {
                return Err(BindingError::InvalidConfig(
                    "client_secret".to_string(),
                    "must be a ${VAR} reference, never a literal secret".to_string(),
                ));
            }
        }

        if let Some(url) = &looker.base_url {
            if parse_env_ref(url).is_none() {
                validate_base_url(url)?;
            }
        }

        if looker.timeout_secs == Some(0) {
            return Err(BindingError::InvalidConfig(
                "timeout_secs".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> crate::Result<ClientSettings> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve `${VAR}` references and env fallbacks through `lookup`.
    pub fn resolve_with<F>(&self, lookup: F) -> crate::Result<ClientSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.validate()?;
        let looker = &self.looker;

        let field = |name: &str, value: &Option<String>, env: &str| -> crate::Result<String> {
            let resolved = match value {
                Some(v) => match parse_env_ref(v) {
                    Some(var) => lookup(var),
                    None => Some(v.clone()),
                },
                None => lookup(env),
            };
            resolved.filter(|v| !v.is_empty()).ok_or_else(|| {
                BindingError::InvalidConfig(
                    name.to_string(),
                    format!("not set in config and {} is empty", env),
                )
            })
        };

        let base_url = field("base_url", &looker.base_url, ENV_BASE_URL)?;
        validate_base_url(&base_url)?;
        let client_id = field("client_id", &looker.client_id, ENV_CLIENT_ID)?;
        let client_secret = field("client_secret", &looker.client_secret, ENV_CLIENT_SECRET)?;

        let verify_ssl = match looker.verify_ssl {
            Some(v) => v,
            None => match lookup(ENV_VERIFY_SSL) {
                Some(raw) => raw.parse::<bool>().map_err(|_| {
                    BindingError::InvalidConfig(
                        "verify_ssl".to_string(),
                        format!("{} must be true or false, got '{}'", ENV_VERIFY_SSL, raw),
                    )
                })?,
                None => true,
            },
        };

        let timeout_secs = match looker.timeout_secs {
            Some(v) => v,
            None => match lookup(ENV_TIMEOUT) {
                Some(raw) => raw.parse::<u64>().ok().filter(|v| *v > 0).ok_or_else(|| {
                    BindingError::InvalidConfig(
                        "timeout_secs".to_string(),
                        format!("{} must be a positive integer, got '{}'", ENV_TIMEOUT, raw),
                    )
                })?,
                None => default_timeout_secs(),
            },
        };

        Ok(ClientSettings {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Credentials {
                client_id,
                client_secret,
            },
            verify_ssl,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn validate_base_url(url: &str) -> crate::Result<()> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(BindingError::InvalidConfig(
            "base_url".to_string(),
            format!("'{}' is not an absolute http(s) url", url),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn parse_toml(toml_str: &str) -> BindingsConfig {
        toml::from_str(toml_str).expect("valid TOML")
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_env_ref() {
        assert_eq!(parse_env_ref("${FOO}"), Some("FOO"));
        assert_eq!(parse_env_ref("$FOO"), None);
        assert_eq!(parse_env_ref("literal"), None);
        assert_eq!(parse_env_ref("${}"), Some(""));
    }

    #[test]
    fn test_resolve_from_file_and_refs() {
        let config = parse_toml(
            r#"
            [looker]
            base_url = "https://example.cloud.looker.com/"
            client_id = "abc"
            client_secret = "${MY_SECRET}"
            verify_ssl = false
            timeout_secs = 15
            "#,
        );
        let settings = config.resolve_with(env(&[("MY_SECRET", "s3cr3t")])).unwrap();
        assert_eq!(settings.base_url, "https://example.cloud.looker.com");
        assert_eq!(settings.api_url(), "https://example.cloud.looker.com/api/4.0");
        assert_eq!(settings.credentials.client_id, "abc");
        assert_eq!(settings.credentials.client_secret, "s3cr3t");
        assert!(!settings.verify_ssl);
        assert_eq!(settings.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_resolve_from_env_only() {
        let config = BindingsConfig::default();
        let settings = config
            .resolve_with(env(&[
                (ENV_BASE_URL, "https://looker.internal:19999"),
                (ENV_CLIENT_ID, "id"),
                (ENV_CLIENT_SECRET, "secret"),
            ]))
            .unwrap();
        assert_eq!(settings.base_url, "https://looker.internal:19999");
        assert!(settings.verify_ssl);
        assert_eq!(settings.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_env_verify_ssl_and_timeout() {
        let settings = BindingsConfig::default()
            .resolve_with(env(&[
                (ENV_BASE_URL, "https://h"),
                (ENV_CLIENT_ID, "id"),
                (ENV_CLIENT_SECRET, "secret"),
                (ENV_VERIFY_SSL, "false"),
                (ENV_TIMEOUT, "30"),
            ]))
            .unwrap();
        assert!(!settings.verify_ssl);
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bad_env_timeout_rejected() {
        let result = BindingsConfig::default().resolve_with(env(&[
            (ENV_BASE_URL, "https://h"),
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_TIMEOUT, "soon"),
        ]));
        assert!(
            matches!(result, Err(BindingError::InvalidConfig(field, msg)) if field == "timeout_secs" && msg.contains("soon"))
        );
    }

    #[test]
    fn test_literal_secret_rejected() {
        let config = parse_toml(
            r#"
            [looker]
            client_secret = "hunter2"
            "#,
        );
        let result = config.validate();
        assert!(
            matches!(result, Err(BindingError::InvalidConfig(field, _)) if field == "client_secret")
        );
    }

    #[test]
    fn test_missing_client_id_reported() {
        let result = BindingsConfig::default()
            .resolve_with(env(&[(ENV_BASE_URL, "https://h"), (ENV_CLIENT_SECRET, "s")]));
        assert!(
            matches!(result, Err(BindingError::InvalidConfig(field, msg)) if field == "client_id" && msg.contains(ENV_CLIENT_ID))
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = parse_toml(
            r#"
            [looker]
            base_url = "example.cloud.looker.com"
            "#,
        );
        let result = config.validate();
        assert!(matches!(result, Err(BindingError::InvalidConfig(field, _)) if field == "base_url"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = parse_toml(
            r#"
            [looker]
            timeout_secs = 0
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[looker]\nbase_url = \"https://example.cloud.looker.com\"\nclient_id = \"abc\""
        )
        .unwrap();

        let config = BindingsConfig::load(file.path()).unwrap();
        assert_eq!(config.looker.client_id.as_deref(), Some("abc"));
        assert!(config.looker.client_secret.is_none());
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[looker\nbase_url =").unwrap();
        assert!(matches!(
            BindingsConfig::load(file.path()),
            Err(BindingError::InvalidConfig(_, _))
        ));
    }
}
