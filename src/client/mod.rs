//! Minimal Looker API 4.0 client for binding operations.
//!
//! Covers client-credentials login plus the role/group/user association
//! endpoints the binding stores read and replace. One request per call: no
//! retries, no caching beyond the access token.

pub mod auth;
pub mod models;

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::client::auth::TokenCache;
use crate::client::models::{ApiErrorBody, Group, GroupWithRoles, Role};
use crate::config::ClientSettings;
use crate::error::BindingError;

/// Sent on every request so Looker can attribute API traffic.
const APP_ID_HEADER: &str = "x-looker-appid";

/// Looker API client. Cheap to clone; clones share the access token.
#[derive(Clone)]
pub struct LookerClient {
    api_url: Url,
    http: Client,
    auth: Arc<TokenCache>,
}

impl LookerClient {
    pub fn new(settings: &ClientSettings) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .user_agent(concat!("looker-bindings/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BindingError::InvalidConfig("client".to_string(), format!("{}", e))
            })?;
        Self::with_http_client(settings, http)
    }

    /// Build a client around a pre-configured `reqwest::Client`.
    pub fn with_http_client(settings: &ClientSettings, http: Client) -> crate::Result<Self> {
        let api_url = Url::parse(&settings.api_url())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                BindingError::InvalidConfig(
                    "base_url".to_string(),
                    format!("'{}' is not a usable base URL", settings.base_url),
                )
            })?;
        let login_url = format!("{}/login", api_url);
        Ok(Self {
            api_url,
            http,
            auth: Arc::new(TokenCache::new(settings.credentials.clone(), login_url)),
        })
    }

    /// Append `segments` to the API root, percent-encoding each as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> crate::Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(BindingError::InvalidBinding(format!(
                "'{}' cannot be used as a path segment",
                bad
            )));
        }
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BindingError::InvalidConfig("base_url".to_string(), "not a base URL".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Groups holding `role_id` (`GET /roles/{role_id}/groups`).
    pub async fn role_groups(&self, role_id: &str) -> crate::Result<Vec<Group>> {
        let url = self.endpoint(&["roles", role_id, "groups"])?;
        let req = self.http.get(url).query(&[("fields", "id")]);
        self.send(req, "role", role_id).await
    }

    /// Replace the groups holding `role_id` (`PUT /roles/{role_id}/groups`).
    pub async fn set_role_groups(
        &self,
        role_id: &str,
        group_ids: &[String],
    ) -> crate::Result<Vec<Group>> {
        let url = self.endpoint(&["roles", role_id, "groups"])?;
        let req = self.http.put(url).json(group_ids);
        self.send(req, "role", role_id).await
    }

    /// Roles granted directly to `user_id`, excluding those inherited via groups.
    pub async fn user_roles(&self, user_id: &str) -> crate::Result<Vec<Role>> {
        let url = self.endpoint(&["users", user_id, "roles"])?;
        let req = self
            .http
            .get(url)
            .query(&[("fields", "id"), ("direct_association_only", "true")]);
        self.send(req, "user", user_id).await
    }

    /// Replace the roles granted directly to `user_id` (`PUT /users/{user_id}/roles`).
    pub async fn set_user_roles(
        &self,
        user_id: &str,
        role_ids: &[String],
    ) -> crate::Result<Vec<Role>> {
        let url = self.endpoint(&["users", user_id, "roles"])?;
        let req = self.http.put(url).json(role_ids);
        self.send(req, "user", user_id).await
    }

    /// Search groups by id, including each hit's roles.
    pub async fn search_groups_with_roles(
        &self,
        group_id: &str,
    ) -> crate::Result<Vec<GroupWithRoles>> {
        let url = self.endpoint(&["groups", "search", "with_roles"])?;
        let req = self.http.get(url).query(&[("id", group_id)]);
        self.send(req, "group", group_id).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> crate::Result<T> {
        let token = self.auth.token(&self.http).await?;
        let response = req
            .bearer_auth(token)
            .header(APP_ID_HEADER, "looker-bindings")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(kind, id, status = status.as_u16(), "looker api response");

        if status == StatusCode::NOT_FOUND {
            return Err(BindingError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(BindingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for LookerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookerClient")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}
