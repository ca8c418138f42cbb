//! Binding resources: typed declarations, binding ids and the CRUD lifecycle.
//!
//! Each binding kind grants a set of associations to one parent entity
//! without claiming the parent's whole association set. The lifecycle is the
//! same for all kinds and runs through [`Reconciler`]; only the store that
//! talks to the Looker API differs.

pub mod group_roles;
pub mod role_groups;
pub mod user_roles;

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::association::AssociationSet;
use crate::client::LookerClient;
use crate::error::BindingError;
use crate::reconciler::{ReadOutcome, Reconciler};
use crate::store::AssociationStore;

pub use group_roles::GroupRolesStore;
pub use role_groups::RoleGroupsStore;
pub use user_roles::UserRolesStore;

/// Separator between the parent id and association ids in a binding id.
const ID_SEPARATOR: char = '_';

/// Ids are placed into request paths: ASCII letters, digits, `.` and `-` only.
fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9.-]+$").expect("static regex"))
}

/// The binding resources this crate manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    /// Groups granted one role.
    RoleGroups,
    /// Roles granted directly to one user.
    UserRoles,
    /// Roles granted to one group.
    GroupRoles,
}

impl BindingKind {
    pub const ALL: [BindingKind; 3] = [
        BindingKind::RoleGroups,
        BindingKind::UserRoles,
        BindingKind::GroupRoles,
    ];

    pub fn resource_name(&self) -> &'static str {
        match self {
            BindingKind::RoleGroups => "looker_role_groups",
            BindingKind::UserRoles => "looker_user_roles",
            BindingKind::GroupRoles => "looker_group_roles",
        }
    }

    pub fn parent_kind(&self) -> &'static str {
        match self {
            BindingKind::RoleGroups => "role",
            BindingKind::UserRoles => "user",
            BindingKind::GroupRoles => "group",
        }
    }

    pub fn association_kind(&self) -> &'static str {
        match self {
            BindingKind::RoleGroups => "group",
            BindingKind::UserRoles | BindingKind::GroupRoles => "role",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            BindingKind::RoleGroups => "role-groups",
            BindingKind::UserRoles => "user-roles",
            BindingKind::GroupRoles => "group-roles",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for BindingKind {
    type Err = BindingError;

    /// Accepts `role-groups`, `role_groups` or `looker_role_groups` (and likewise for other kinds).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        let normalized = normalized.strip_prefix("looker_").unwrap_or(&normalized);
        BindingKind::ALL
            .into_iter()
            .find(|k| k.resource_name().trim_start_matches("looker_") == normalized)
            .ok_or_else(|| {
                BindingError::InvalidBinding(format!(
                    "unknown binding kind '{}', expected one of role-groups, user-roles, group-roles",
                    s
                ))
            })
    }
}

/// A validated binding declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    pub kind: BindingKind,
    pub parent_id: String,
    pub associations: AssociationSet,
}

impl BindingConfig {
    /// Validate and build a declaration.
    ///
    /// Rejects empty or malformed ids, duplicate association ids and an empty
    /// association list.
    pub fn new<I, S>(kind: BindingKind, parent_id: impl Into<String>, ids: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parent_id = parent_id.into();
        validate_id(kind.parent_kind(), &parent_id)?;

        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(BindingError::InvalidBinding(format!(
                "{} needs at least one {} id",
                kind.resource_name(),
                kind.association_kind()
            )));
        }
        for id in &ids {
            validate_id(kind.association_kind(), id)?;
        }

        let associations: AssociationSet = ids.iter().cloned().collect();
        if associations.len() != ids.len() {
            return Err(BindingError::InvalidBinding(format!(
                "duplicate {} ids in {}",
                kind.association_kind(),
                kind.resource_name()
            )));
        }

        Ok(Self {
            kind,
            parent_id,
            associations,
        })
    }

    pub fn binding_id(&self) -> String {
        format_binding_id(&self.parent_id, &self.associations)
    }
}

fn validate_id(what: &str, id: &str) -> crate::Result<()> {
    // `.` and `..` would be resolved as dot segments in a URL path.
    if id_pattern().is_match(id) && id != "." && id != ".." {
        Ok(())
    } else {
        Err(BindingError::InvalidBinding(format!(
            "invalid {} id '{}': use letters, digits, '.' and '-' only",
            what, id
        )))
    }
}

/// `<parent_id>_<assoc_1>_<assoc_2>...`
pub fn format_binding_id(parent_id: &str, associations: &AssociationSet) -> String {
    let mut id = parent_id.to_string();
    for assoc in associations {
        id.push(ID_SEPARATOR);
        id.push_str(assoc);
    }
    id
}

/// Split a binding id back into its parent id and association ids.
pub fn parse_binding_id(id: &str) -> crate::Result<(String, AssociationSet)> {
    let mut parts = id.split(ID_SEPARATOR);
    let parent = parts.next().unwrap_or_default();
    let assocs: Vec<&str> = parts.collect();
    if parent.is_empty() || assocs.is_empty() || assocs.iter().any(|a| a.is_empty()) {
        return Err(BindingError::InvalidBinding(format!(
            "invalid id '{}', should be of the form <parent_id>_<id>[_<id>...]",
            id
        )));
    }
    let associations: AssociationSet = assocs.iter().copied().collect();
    if associations.len() != assocs.len() {
        return Err(BindingError::InvalidBinding(format!(
            "invalid id '{}', duplicate association ids",
            id
        )));
    }
    Ok((parent.to_string(), associations))
}

/// Observed state of a binding, as reported after each lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingState {
    pub id: String,
    pub kind: BindingKind,
    pub parent_id: String,
    /// The declared associations the parent currently holds.
    pub associations: AssociationSet,
}

/// Lifecycle driver for one binding kind.
pub struct BindingResource<S> {
    kind: BindingKind,
    reconciler: Reconciler<S>,
}

impl<S: AssociationStore> BindingResource<S> {
    pub fn new(kind: BindingKind, store: S) -> Self {
        Self {
            kind,
            reconciler: Reconciler::new(store),
        }
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    pub async fn create(&self, config: &BindingConfig) -> crate::Result<BindingState> {
        self.check_kind(config)?;
        let managed = self
            .reconciler
            .create(&config.parent_id, &config.associations)
            .await?;
        Ok(BindingState {
            id: config.binding_id(),
            kind: self.kind,
            parent_id: config.parent_id.clone(),
            associations: managed,
        })
    }

    /// Refresh `state` from the remote. `None` means the binding is gone.
    pub async fn read(&self, state: &BindingState) -> crate::Result<Option<BindingState>> {
        match self
            .reconciler
            .read(&state.parent_id, &state.associations)
            .await?
        {
            ReadOutcome::Present(managed) => Ok(Some(BindingState {
                associations: managed,
                ..state.clone()
            })),
            ReadOutcome::Gone => Ok(None),
        }
    }

    /// Move the binding from `state` to the declaration in `config`.
    ///
    /// The parent cannot change in place; such a binding has to be deleted and
    /// created again.
    pub async fn update(
        &self,
        state: &BindingState,
        config: &BindingConfig,
    ) -> crate::Result<BindingState> {
        self.check_kind(config)?;
        if state.parent_id != config.parent_id {
            return Err(BindingError::InvalidBinding(format!(
                "{} id cannot change from '{}' to '{}'; replace the binding instead",
                self.kind.parent_kind(),
                state.parent_id,
                config.parent_id
            )));
        }
        let managed = self
            .reconciler
            .update(&config.parent_id, &state.associations, &config.associations)
            .await?;
        Ok(BindingState {
            id: config.binding_id(),
            kind: self.kind,
            parent_id: config.parent_id.clone(),
            associations: managed,
        })
    }

    pub async fn delete(&self, state: &BindingState) -> crate::Result<()> {
        self.reconciler
            .delete(&state.parent_id, &state.associations)
            .await
    }

    /// Adopt an existing binding from its binding id.
    pub async fn import(&self, id: &str) -> crate::Result<Option<BindingState>> {
        let (parent_id, associations) = parse_binding_id(id)?;
        let config = BindingConfig::new(self.kind, parent_id, associations)?;
        let state = BindingState {
            id: id.to_string(),
            kind: self.kind,
            parent_id: config.parent_id,
            associations: config.associations,
        };
        self.read(&state).await
    }

    fn check_kind(&self, config: &BindingConfig) -> crate::Result<()> {
        if config.kind != self.kind {
            return Err(BindingError::InvalidBinding(format!(
                "{} declaration handed to {}",
                config.kind.resource_name(),
                self.kind.resource_name()
            )));
        }
        Ok(())
    }
}

/// Collect record ids, failing on the first record without one.
pub(crate) fn collect_ids<I>(
    ids: I,
    parent_kind: &'static str,
    parent_id: &str,
    kind: &'static str,
) -> crate::Result<AssociationSet>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut out = Vec::new();
    for id in ids {
        match id {
            Some(id) => out.push(id),
            None => {
                return Err(BindingError::MissingId {
                    parent_kind,
                    parent_id: parent_id.to_string(),
                    kind,
                });
            }
        }
    }
    Ok(out.into_iter().collect())
}

/// A Looker-backed store for any binding kind.
pub enum LookerStore {
    RoleGroups(RoleGroupsStore),
    UserRoles(UserRolesStore),
    GroupRoles(GroupRolesStore),
}

impl LookerStore {
    pub fn new(kind: BindingKind, client: LookerClient) -> Self {
        match kind {
            BindingKind::RoleGroups => LookerStore::RoleGroups(RoleGroupsStore::new(client)),
            BindingKind::UserRoles => LookerStore::UserRoles(UserRolesStore::new(client)),
            BindingKind::GroupRoles => LookerStore::GroupRoles(GroupRolesStore::new(client)),
        }
    }
}

impl AssociationStore for LookerStore {
    fn parent_kind(&self) -> &'static str {
        match self {
            LookerStore::RoleGroups(s) => s.parent_kind(),
            LookerStore::UserRoles(s) => s.parent_kind(),
            LookerStore::GroupRoles(s) => s.parent_kind(),
        }
    }

    fn association_kind(&self) -> &'static str {
        match self {
            LookerStore::RoleGroups(s) => s.association_kind(),
            LookerStore::UserRoles(s) => s.association_kind(),
            LookerStore::GroupRoles(s) => s.association_kind(),
        }
    }

    async fn fetch_associations(&self, parent_id: &str) -> crate::Result<AssociationSet> {
        match self {
            LookerStore::RoleGroups(s) => s.fetch_associations(parent_id).await,
            LookerStore::UserRoles(s) => s.fetch_associations(parent_id).await,
            LookerStore::GroupRoles(s) => s.fetch_associations(parent_id).await,
        }
    }

    async fn set_associations(
        &self,
        parent_id: &str,
        associations: &AssociationSet,
    ) -> crate::Result<()> {
        match self {
            LookerStore::RoleGroups(s) => s.set_associations(parent_id, associations).await,
            LookerStore::UserRoles(s) => s.set_associations(parent_id, associations).await,
            LookerStore::GroupRoles(s) => s.set_associations(parent_id, associations).await,
        }
    }
}

impl BindingResource<LookerStore> {
    /// A resource of `kind` talking to Looker through `client`.
    pub fn looker(kind: BindingKind, client: LookerClient) -> Self {
        BindingResource::new(kind, LookerStore::new(kind, client))
    }
}
