//! Client-credentials login and access token caching.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::client::models::AccessTokenResponse;
use crate::error::BindingError;

/// Tokens are refreshed this long before the server says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the login response carries no `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// API client id and secret.
///
/// The [`Debug`] impl redacts the secret so credentials never reach logs.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Holds the current access token, logging in again once it is stale.
pub(crate) struct TokenCache {
    credentials: Credentials,
    login_url: String,
    current: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub(crate) fn new(credentials: Credentials, login_url: String) -> Self {
        Self {
            credentials,
            login_url,
            current: Mutex::new(None),
        }
    }

    /// Return a valid access token, logging in if none is cached or it is about to expire.
    pub(crate) async fn token(&self, http: &reqwest::Client) -> crate::Result<String> {
        let mut current = self.current.lock().await;
        if let Some(cached) = current.as_ref() {
            if Instant::now() + EXPIRY_MARGIN < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }

        let fresh = self.login(http).await?;
        let value = fresh.value.clone();
        *current = Some(fresh);
        Ok(value)
    }

    async fn login(&self, http: &reqwest::Client) -> crate::Result<CachedToken> {
        tracing::debug!(client_id = %self.credentials.client_id, "logging in to looker");

        let response = http
            .post(&self.login_url)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BindingError::Auth(format!(
                "login returned {}",
                status.as_u16()
            )));
        }

        let body: AccessTokenResponse = response.json().await?;
        let ttl = body
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);

        Ok(CachedToken {
            value: body.access_token,
            expires_at: Instant::now() + ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials {
            client_id: "abc".to_string(),
            client_secret: "super-secret".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("abc"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
