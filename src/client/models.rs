//! Wire records returned by the Looker API (only the fields bindings read).

use serde::Deserialize;

/// A group as returned by role and search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A role as returned by user and group endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A group search hit carrying the roles granted to the group.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupWithRoles {
    pub id: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// Body of a non-success API response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: Option<String>,
}

/// Response of the client-credentials login endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
