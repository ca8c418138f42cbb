//! `looker_group_roles`: roles granted to one group.
//!
//! Looker has no call that replaces a group's roles. Grants are owned by the
//! role (`PUT /roles/{id}/groups`), so replacing a group's role set means
//! one read-modify-write per role whose membership changes. Those writes are
//! independent: each is attempted and failures are reported together.
//!
//! A role record without an id stops the loop. Roles written before that
//! point stay written; nothing is rolled back.

use crate::association::AssociationSet;
use crate::client::LookerClient;
use crate::error::{BindingError, WriteErrors};
use crate::resources::collect_ids;
use crate::store::AssociationStore;

#[derive(Debug, Clone)]
pub struct GroupRolesStore {
    client: LookerClient,
}

impl GroupRolesStore {
    pub fn new(client: LookerClient) -> Self {
        Self { client }
    }

    /// Add `group_id` to (or drop it from) the groups holding `role_id`.
    async fn regrant(&self, role_id: &str, group_id: &str, attach: bool) -> crate::Result<()> {
        let groups = self.client.role_groups(role_id).await?;
        let current = collect_ids(groups.into_iter().map(|g| g.id), "role", role_id, "group")?;
        let target: AssociationSet = [group_id].into_iter().collect();
        let next = if attach {
            current.union(&target)
        } else {
            current.subtract(&target)
        };
        self.client.set_role_groups(role_id, next.as_slice()).await?;
        Ok(())
    }
}

impl AssociationStore for GroupRolesStore {
    fn parent_kind(&self) -> &'static str {
        "group"
    }

    fn association_kind(&self) -> &'static str {
        "role"
    }

    async fn fetch_associations(&self, group_id: &str) -> crate::Result<AssociationSet> {
        let mut hits = self.client.search_groups_with_roles(group_id).await?;
        // The search must resolve to exactly this group.
        let group = match hits.pop() {
            Some(group) if hits.is_empty() && group.id.as_deref() == Some(group_id) => group,
            _ => {
                return Err(BindingError::NotFound {
                    kind: "group",
                    id: group_id.to_string(),
                });
            }
        };
        // A group without any role grant comes back with no `roles` list.
        let roles = group.roles.unwrap_or_default();
        collect_ids(roles.into_iter().map(|r| r.id), "group", group_id, "role")
    }

    /// Only roles whose membership changes are written, one request each.
    async fn set_associations(
        &self,
        group_id: &str,
        role_ids: &AssociationSet,
    ) -> crate::Result<()> {
        let current = self.fetch_associations(group_id).await?;
        let grants = current.right_only(role_ids);
        let revokes = role_ids.right_only(&current);

        let mut errors = WriteErrors::new();
        let changes = grants
            .iter()
            .map(|r| (r, true))
            .chain(revokes.iter().map(|r| (r, false)));
        for (role_id, attach) in changes {
            match self.regrant(role_id, group_id, attach).await {
                Ok(()) => {}
                Err(e @ BindingError::MissingId { .. }) => {
                    if errors.is_empty() {
                        return Err(e);
                    }
                    // Keep the failures already seen alongside the abort.
                    tracing::warn!(
                        group = %group_id,
                        role = %role_id,
                        failed = errors.len(),
                        "aborting role writes on a record without an id"
                    );
                    errors.push(role_id.as_str(), e);
                    return errors.into_result();
                }
                Err(e) => {
                    tracing::warn!(
                        group = %group_id,
                        role = %role_id,
                        attach,
                        error = %e,
                        "role grant write failed"
                    );
                    errors.push(role_id.as_str(), e);
                }
            }
        }

        tracing::debug!(
            group = %group_id,
            granted = grants.len(),
            revoked = revokes.len(),
            failed = errors.len(),
            "group role writes attempted"
        );
        errors.into_result()
    }
}
