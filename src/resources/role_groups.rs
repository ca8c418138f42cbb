//! `looker_role_groups`: groups granted one role.

use crate::association::AssociationSet;
use crate::client::LookerClient;
use crate::resources::collect_ids;
use crate::store::AssociationStore;

/// Reads and replaces the groups holding a role in a single request each.
#[derive(Debug, Clone)]
pub struct RoleGroupsStore {
    client: LookerClient,
}

impl RoleGroupsStore {
    pub fn new(client: LookerClient) -> Self {
        Self { client }
    }
}

impl AssociationStore for RoleGroupsStore {
    fn parent_kind(&self) -> &'static str {
        "role"
    }

    fn association_kind(&self) -> &'static str {
        "group"
    }

    async fn fetch_associations(&self, role_id: &str) -> crate::Result<AssociationSet> {
        let groups = self.client.role_groups(role_id).await?;
        collect_ids(groups.into_iter().map(|g| g.id), "role", role_id, "group")
    }

    async fn set_associations(
        &self,
        role_id: &str,
        group_ids: &AssociationSet,
    ) -> crate::Result<()> {
        self.client
            .set_role_groups(role_id, group_ids.as_slice())
            .await?;
        Ok(())
    }
}
