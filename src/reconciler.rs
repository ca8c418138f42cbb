//! Binding reconciler: additive writes against a remotely-authoritative set.
//!
//! The remote system owns the full association set of a parent entity and
//! only offers full-replace writes. A binding declares a subset of that set.
//! Every write is therefore assembled from two parts:
//!
//! - the *foreign remainder*: remote associations the binding does not
//!   account for, which must survive the write, and
//! - the declared associations the binding wants present.
//!
//! The same algorithm backs every binding kind:
//!
//! | operation | foreign remainder          | write              |
//! |-----------|----------------------------|--------------------|
//! | create    | `remote \ declared`        | `foreign ∪ declared` |
//! | update    | `remote \ old`             | `foreign ∪ new`    |
//! | delete    | `remote \ declared`        | `foreign`          |
//!
//! Reads report `declared ∩ remote` as the managed subset.

use serde::Serialize;

use crate::association::AssociationSet;
use crate::store::AssociationStore;

/// The write a change resolves to, given the live remote set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WritePlan {
    /// Remote associations outside the binding's management.
    pub foreign: AssociationSet,
    /// The full set to hand to the remote replace call.
    pub write: AssociationSet,
}

/// A requested change to a binding.
#[derive(Debug, Clone)]
pub enum Change<'a> {
    Create { declared: &'a AssociationSet },
    Update {
        old: &'a AssociationSet,
        new: &'a AssociationSet,
    },
    Delete { declared: &'a AssociationSet },
}

impl Change<'_> {
    fn name(&self) -> &'static str {
        match self {
            Change::Create { .. } => "create",
            Change::Update { .. } => "update",
            Change::Delete { .. } => "delete",
        }
    }

    /// Resolve the change against `remote`.
    pub fn plan(&self, remote: &AssociationSet) -> WritePlan {
        match self {
            Change::Create { declared } => plan_create(declared, remote),
            Change::Update { old, new } => plan_update(old, new, remote),
            Change::Delete { declared } => plan_delete(declared, remote),
        }
    }
}

pub fn plan_create(declared: &AssociationSet, remote: &AssociationSet) -> WritePlan {
    let foreign = declared.right_only(remote);
    let write = foreign.union(declared);
    WritePlan { foreign, write }
}

/// Preserve is computed against `old`, so associations dropped from the
/// declaration are removed while anything `old` never declared survives.
pub fn plan_update(
    old: &AssociationSet,
    new: &AssociationSet,
    remote: &AssociationSet,
) -> WritePlan {
    let foreign = old.right_only(remote);
    let write = foreign.union(new);
    WritePlan { foreign, write }
}

pub fn plan_delete(declared: &AssociationSet, remote: &AssociationSet) -> WritePlan {
    let foreign = declared.right_only(remote);
    WritePlan {
        write: foreign.clone(),
        foreign,
    }
}

/// The part of `remote` the declaration accounts for, in remote order.
pub fn managed_subset(declared: &AssociationSet, remote: &AssociationSet) -> AssociationSet {
    remote.subtract(&declared.symmetric_difference(remote))
}

/// Outcome of reading a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The parent exists; these are the declared associations it holds.
    Present(AssociationSet),
    /// The parent was deleted remotely.
    Gone,
}

/// Drives create/read/update/delete for one binding kind over a store.
pub struct Reconciler<S> {
    store: S,
}

impl<S: AssociationStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the live remote set and resolve `change` against it, without writing.
    pub async fn plan(&self, parent_id: &str, change: &Change<'_>) -> crate::Result<WritePlan> {
        let remote = self.store.fetch_associations(parent_id).await?;
        let plan = change.plan(&remote);
        tracing::debug!(
            parent = %parent_id,
            kind = self.store.parent_kind(),
            change = change.name(),
            remote = remote.len(),
            foreign = plan.foreign.len(),
            write = plan.write.len(),
            "planned binding write"
        );
        Ok(plan)
    }

    /// Attach `declared` to the parent, keeping every association already there.
    ///
    /// Returns the managed subset observed after the write.
    pub async fn create(
        &self,
        parent_id: &str,
        declared: &AssociationSet,
    ) -> crate::Result<AssociationSet> {
        self.apply(parent_id, &Change::Create { declared }).await?;
        self.read_back(parent_id, declared).await
    }

    /// Observe which declared associations the parent currently holds.
    pub async fn read(
        &self,
        parent_id: &str,
        declared: &AssociationSet,
    ) -> crate::Result<ReadOutcome> {
        match self.store.fetch_associations(parent_id).await {
            Ok(remote) => Ok(ReadOutcome::Present(managed_subset(declared, &remote))),
            Err(e) if e.is_not_found() => {
                tracing::info!(
                    parent = %parent_id,
                    kind = self.store.parent_kind(),
                    "parent no longer exists, binding is gone"
                );
                Ok(ReadOutcome::Gone)
            }
            Err(e) => Err(e),
        }
    }

    /// Move the declaration from `old` to `new`.
    pub async fn update(
        &self,
        parent_id: &str,
        old: &AssociationSet,
        new: &AssociationSet,
    ) -> crate::Result<AssociationSet> {
        self.apply(parent_id, &Change::Update { old, new }).await?;
        self.read_back(parent_id, new).await
    }

    /// Remove the declared associations, leaving foreign ones in place.
    ///
    /// A parent that no longer exists is treated as already deleted.
    pub async fn delete(&self, parent_id: &str, declared: &AssociationSet) -> crate::Result<()> {
        match self.apply(parent_id, &Change::Delete { declared }).await {
            Err(e) if e.is_not_found() => {
                tracing::info!(
                    parent = %parent_id,
                    kind = self.store.parent_kind(),
                    "parent already deleted, nothing to unbind"
                );
                Ok(())
            }
            other => other,
        }
    }

    async fn apply(&self, parent_id: &str, change: &Change<'_>) -> crate::Result<()> {
        let plan = self.plan(parent_id, change).await?;
        self.store.set_associations(parent_id, &plan.write).await?;
        tracing::info!(
            parent = %parent_id,
            kind = self.store.parent_kind(),
            change = change.name(),
            associations = plan.write.len(),
            preserved = plan.foreign.len(),
            "binding written"
        );
        Ok(())
    }

    async fn read_back(
        &self,
        parent_id: &str,
        declared: &AssociationSet,
    ) -> crate::Result<AssociationSet> {
        let remote = self.store.fetch_associations(parent_id).await?;
        let missing = remote.right_only(declared);
        if !missing.is_empty() {
            tracing::warn!(
                parent = %parent_id,
                kind = self.store.parent_kind(),
                missing = ?missing.as_slice(),
                "declared {}s absent after write",
                self.store.association_kind()
            );
        }
        Ok(managed_subset(declared, &remote))
    }
}
