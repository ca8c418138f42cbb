//! Reconciliation guarantees, checked against an in-memory store.

use looker_bindings::{AssociationSet, MemoryStore, ReadOutcome, Reconciler};

fn set(ids: &[&str]) -> AssociationSet {
    ids.iter().copied().collect()
}

fn reconciler(remote: &AssociationSet) -> Reconciler<MemoryStore> {
    Reconciler::new(MemoryStore::new("role", "group").with_parent("p", remote.clone()))
}

fn remote_of(rec: &Reconciler<MemoryStore>) -> AssociationSet {
    rec.store().associations("p").expect("parent exists")
}

/// (remote, declared) pairs covering disjoint, overlapping, contained and empty cases.
fn cases() -> Vec<(AssociationSet, AssociationSet)> {
    vec![
        (set(&["r1", "r2", "r3"]), set(&["r2", "r4"])),
        (set(&["r1", "r2"]), set(&["r3", "r4"])),
        (set(&["r1", "r2"]), set(&["r1", "r2"])),
        (set(&[]), set(&["r1"])),
        (set(&["r1", "r2", "r3"]), set(&["r2"])),
    ]
}

#[tokio::test]
async fn test_create_is_idempotent() {
    for (remote, declared) in cases() {
        let rec = reconciler(&remote);
        let first = rec.create("p", &declared).await.unwrap();
        let after_first = remote_of(&rec);
        let second = rec.create("p", &declared).await.unwrap();

        assert_eq!(first, second, "remote {remote:?}, declared {declared:?}");
        assert_eq!(after_first, remote_of(&rec));
    }
}

#[tokio::test]
async fn test_create_is_additive() {
    for (remote, declared) in cases() {
        let rec = reconciler(&remote);
        let managed = rec.create("p", &declared).await.unwrap();

        assert_eq!(remote_of(&rec), remote.union(&declared));
        assert_eq!(managed, declared);
    }
}

#[tokio::test]
async fn test_update_replaces_exactly_the_declared_delta() {
    // (remote, old, new) with old ⊆ remote
    let cases = [
        (set(&["r1", "r2", "r3", "r4"]), set(&["r2", "r4"]), set(&["r4"])),
        (set(&["r1", "r2"]), set(&["r2"]), set(&["r5", "r6"])),
        (set(&["r1", "r2"]), set(&["r1", "r2"]), set(&[])),
        (set(&["r1", "r2"]), set(&["r1"]), set(&["r2"])),
    ];
    for (remote, old, new) in cases {
        let rec = reconciler(&remote);
        let managed = rec.update("p", &old, &new).await.unwrap();

        let expected = remote.subtract(&old).union(&new);
        assert_eq!(remote_of(&rec), expected, "old {old:?} -> new {new:?}");
        assert_eq!(managed, new);
    }
}

#[tokio::test]
async fn test_delete_removes_only_the_declared_subset() {
    for (remote, declared) in cases() {
        // Start from a state where the declaration is held.
        let rec = reconciler(&remote.union(&declared));
        rec.delete("p", &declared).await.unwrap();

        assert_eq!(remote_of(&rec), remote.union(&declared).subtract(&declared));
        assert_eq!(
            rec.read("p", &declared).await.unwrap(),
            ReadOutcome::Present(set(&[]))
        );
    }
}

#[tokio::test]
async fn test_foreign_grant_added_between_steps_survives() {
    let rec = reconciler(&set(&["r1"]));
    rec.create("p", &set(&["r2"])).await.unwrap();

    // Another tool grants r9 while this binding is live.
    rec.store().insert_parent("p", ["r1", "r2", "r9"]);

    rec.update("p", &set(&["r2"]), &set(&["r3"])).await.unwrap();
    assert_eq!(remote_of(&rec), set(&["r1", "r9", "r3"]));

    rec.delete("p", &set(&["r3"])).await.unwrap();
    assert_eq!(remote_of(&rec), set(&["r1", "r9"]));
}

#[tokio::test]
async fn test_worked_example() {
    let rec = reconciler(&set(&["r1", "r2", "r3"]));
    let declared = set(&["r2", "r4"]);

    rec.create("p", &declared).await.unwrap();
    let (_, written) = rec.store().writes().pop().unwrap();
    assert_eq!(written, set(&["r1", "r2", "r3", "r4"]));
    assert_eq!(
        rec.read("p", &declared).await.unwrap(),
        ReadOutcome::Present(set(&["r2", "r4"]))
    );

    rec.update("p", &declared, &set(&["r4"])).await.unwrap();
    let (_, written) = rec.store().writes().pop().unwrap();
    assert_eq!(written, set(&["r1", "r3", "r4"]));
}
