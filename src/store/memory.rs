//! In-process association store.
//!
//! Holds parent → association mappings in a map, records every replace
//! call, and can be told to fail fetches or writes for a given parent.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::association::AssociationSet;
use crate::error::BindingError;
use crate::store::AssociationStore;

#[derive(Default)]
struct Inner {
    parents: HashMap<String, AssociationSet>,
    writes: Vec<(String, AssociationSet)>,
    failing_fetches: HashSet<String>,
    failing_writes: HashSet<String>,
}

/// Association store backed by an in-memory map.
pub struct MemoryStore {
    parent_kind: &'static str,
    association_kind: &'static str,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(parent_kind: &'static str, association_kind: &'static str) -> Self {
        Self {
            parent_kind,
            association_kind,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed (or overwrite) the associations of `parent_id`.
    pub fn with_parent<I, S>(self, parent_id: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_parent(parent_id, ids);
        self
    }

    pub fn insert_parent<I, S>(&self, parent_id: &str, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: AssociationSet = ids.into_iter().map(Into::into).collect();
        self.lock().parents.insert(parent_id.to_string(), set);
    }

    /// Simulate the parent being deleted out of band.
    pub fn remove_parent(&self, parent_id: &str) {
        self.lock().parents.remove(parent_id);
    }

    /// Current associations of `parent_id`, or `None` if it does not exist.
    pub fn associations(&self, parent_id: &str) -> Option<AssociationSet> {
        self.lock().parents.get(parent_id).cloned()
    }

    /// Every replace call issued so far, in order.
    pub fn writes(&self) -> Vec<(String, AssociationSet)> {
        self.lock().writes.clone()
    }

    pub fn fail_fetches_for(&self, parent_id: &str) {
        self.lock().failing_fetches.insert(parent_id.to_string());
    }

    pub fn fail_writes_for(&self, parent_id: &str) {
        self.lock().failing_writes.insert(parent_id.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AssociationStore for MemoryStore {
    fn parent_kind(&self) -> &'static str {
        self.parent_kind
    }

    fn association_kind(&self) -> &'static str {
        self.association_kind
    }

    async fn fetch_associations(&self, parent_id: &str) -> crate::Result<AssociationSet> {
        let inner = self.lock();
        if inner.failing_fetches.contains(parent_id) {
            return Err(BindingError::Api {
                status: 500,
                message: format!("fetch of {} '{}' failed", self.parent_kind, parent_id),
            });
        }
        inner
            .parents
            .get(parent_id)
            .cloned()
            .ok_or_else(|| BindingError::NotFound {
                kind: self.parent_kind,
                id: parent_id.to_string(),
            })
    }

    async fn set_associations(
        &self,
        parent_id: &str,
        associations: &AssociationSet,
    ) -> crate::Result<()> {
        let mut inner = self.lock();
        inner
            .writes
            .push((parent_id.to_string(), associations.clone()));
        if inner.failing_writes.contains(parent_id) {
            return Err(BindingError::Api {
                status: 500,
                message: format!("write to {} '{}' failed", self.parent_kind, parent_id),
            });
        }
        match inner.parents.get_mut(parent_id) {
            Some(current) => {
                *current = associations.clone();
                Ok(())
            }
            None => Err(BindingError::NotFound {
                kind: self.parent_kind,
                id: parent_id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_unknown_parent_is_not_found() {
        let store = MemoryStore::new("role", "group");
        let err = store.fetch_associations("9").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_replaces_and_records() {
        let store = MemoryStore::new("role", "group").with_parent("1", ["a", "b"]);
        let next: AssociationSet = ["c"].into_iter().collect();
        store.set_associations("1", &next).await.unwrap();

        assert_eq!(store.associations("1").unwrap(), next);
        assert_eq!(store.writes(), vec![("1".to_string(), next)]);
    }

    #[tokio::test]
    async fn test_injected_write_failure_leaves_state() {
        let store = MemoryStore::new("user", "role").with_parent("u", ["r1"]);
        store.fail_writes_for("u");
        let result = store.set_associations("u", &AssociationSet::new()).await;
        assert!(matches!(result, Err(BindingError::Api { status: 500, .. })));
        assert_eq!(store.associations("u").unwrap().as_slice(), ["r1"]);
    }
}
