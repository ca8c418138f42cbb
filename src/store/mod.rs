//! Remote association accessors.
//!
//! An [`AssociationStore`] is the reconciler's only view of the remote
//! system: it can read the full association set of a parent entity and
//! replace it wholesale. Every binding kind provides one, and
//! [`memory::MemoryStore`] backs tests and dry runs.

pub mod memory;

use std::future::Future;

use crate::association::AssociationSet;

/// Read and replace the associations held by a remote parent entity.
pub trait AssociationStore: Send + Sync {
    /// Label for the parent entity, e.g. `"role"`.
    fn parent_kind(&self) -> &'static str;

    /// Label for the associated entity, e.g. `"group"`.
    fn association_kind(&self) -> &'static str;

    /// Fetch the live association set of `parent_id`.
    ///
    /// Returns [`crate::BindingError::NotFound`] when the parent no longer
    /// exists and [`crate::BindingError::MissingId`] when a remote record
    /// carries no id.
    fn fetch_associations(
        &self,
        parent_id: &str,
    ) -> impl Future<Output = crate::Result<AssociationSet>> + Send;

    /// Replace the full association set of `parent_id` with `associations`.
    fn set_associations(
        &self,
        parent_id: &str,
        associations: &AssociationSet,
    ) -> impl Future<Output = crate::Result<()>> + Send;
}
