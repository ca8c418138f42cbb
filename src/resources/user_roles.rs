//! `looker_user_roles`: roles granted directly to one user.
//!
//! Only direct grants are considered. Roles a user inherits through group
//! membership are never read, so they can never be written back as direct
//! grants.

use crate::association::AssociationSet;
use crate::client::LookerClient;
use crate::resources::collect_ids;
use crate::store::AssociationStore;

#[derive(Debug, Clone)]
pub struct UserRolesStore {
    client: LookerClient,
}

impl UserRolesStore {
    pub fn new(client: LookerClient) -> Self {
        Self { client }
    }
}

impl AssociationStore for UserRolesStore {
    fn parent_kind(&self) -> &'static str {
        "user"
    }

    fn association_kind(&self) -> &'static str {
        "role"
    }

    async fn fetch_associations(&self, user_id: &str) -> crate::Result<AssociationSet> {
        let roles = self.client.user_roles(user_id).await?;
        collect_ids(roles.into_iter().map(|r| r.id), "user", user_id, "role")
    }

    async fn set_associations(
        &self,
        user_id: &str,
        role_ids: &AssociationSet,
    ) -> crate::Result<()> {
        self.client.set_user_roles(user_id, role_ids.as_slice()).await?;
        Ok(())
    }
}
