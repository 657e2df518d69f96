//! Coordinator against a store that applies batches step by step. Partial
//! failures leave the copies diverged and must surface as errors.

use minimal_planner::{EntriesExt, PlannerError, RecordsExt, StoreError, Todo, User, WriteBatch};

use crate::support::{ann, bob, reload, seed, SequentialStore};

fn todo(name: &str) -> Todo {
    Todo {
        name: name.into(),
        ..Todo::default()
    }
}

#[test]
fn healthy_store_behaves_like_atomic() {
    let store = SequentialStore::new();
    let owner = ann();
    seed(&store, &[owner.clone()]);

    let created = store.entries::<Todo>().create(&owner, todo("Buy milk")).unwrap();
    assert_eq!(reload(&store, &owner).todos, vec![created.clone()]);

    store.entries::<Todo>().delete(&owner, &created.id).unwrap();
    assert!(reload(&store, &owner).todos.is_empty());
    assert!(store.records::<Todo>().all().unwrap().is_empty());
}

#[test]
fn failed_append_leaves_orphan_and_reports_error() {
    let store = SequentialStore::new();
    let owner = ann();
    seed(&store, &[owner.clone()]);
    store.fail_writes_to("user");

    let err = store.entries::<Todo>().create(&owner, todo("Buy milk")).unwrap_err();
    assert_eq!(
        err,
        PlannerError::Store(StoreError::Storage("injected failure".into()))
    );

    store.heal();
    let orphans = store.records::<Todo>().all().unwrap();
    assert_eq!(orphans.len(), 1);
    assert!(reload(&store, &owner).todos.is_empty());
}

#[test]
fn failed_pull_is_a_server_error() {
    let store = SequentialStore::new();
    let owner = ann();
    seed(&store, &[owner.clone()]);
    let created = store.entries::<Todo>().create(&owner, todo("Buy milk")).unwrap();

    store.fail_writes_to("user");
    let err = store.entries::<Todo>().delete(&owner, &created.id).unwrap_err();
    assert!(matches!(err, PlannerError::Store(_)));

    store.heal();
    assert!(store.records::<Todo>().get(&created.id).unwrap().is_none());
    assert_eq!(reload(&store, &owner).todos.len(), 1);
}

#[test]
fn foreign_writes_are_refused_before_any_step() {
    let store = SequentialStore::new();
    let (owner, other) = (ann(), bob());
    seed(&store, &[owner.clone(), other.clone()]);
    let created = store.entries::<Todo>().create(&owner, todo("Buy milk")).unwrap();

    let err = store
        .entries::<Todo>()
        .update(&other, &created.id, todo("Changed"))
        .unwrap_err();
    assert_eq!(err, PlannerError::not_found("Todo"));

    let err = store.entries::<Todo>().delete(&other, &created.id).unwrap_err();
    assert_eq!(err, PlannerError::not_found("Todo"));

    let canonical = store.records::<Todo>().get(&created.id).unwrap().unwrap();
    assert_eq!(canonical.name, "Buy milk");
    assert_eq!(reload(&store, &owner).todos, vec![canonical]);
}

#[test]
fn stale_owner_update_diverges_without_atomicity() {
    let store = SequentialStore::new();
    let owner = ann();
    seed(&store, &[owner.clone()]);
    let created = store.entries::<Todo>().create(&owner, todo("Buy milk")).unwrap();
    let stale = reload(&store, &owner);

    WriteBatch::new()
        .modify::<User, _>(&owner.id, |user| {
            user.todos.clear();
            Ok(())
        })
        .commit(&store)
        .unwrap();

    let err = store
        .entries::<Todo>()
        .update(&stale, &created.id, todo("Changed"))
        .unwrap_err();
    assert_eq!(err, PlannerError::not_found("Todo"));

    // Canonical step landed, embedded step did not.
    let canonical = store.records::<Todo>().get(&created.id).unwrap().unwrap();
    assert_eq!(canonical.name, "Changed");
    assert!(reload(&store, &owner).todos.is_empty());
}

#[test]
fn stale_owner_delete_is_a_server_error() {
    let store = SequentialStore::new();
    let owner = ann();
    seed(&store, &[owner.clone()]);
    let created = store.entries::<Todo>().create(&owner, todo("Buy milk")).unwrap();
    let stale = reload(&store, &owner);

    WriteBatch::new()
        .modify::<User, _>(&owner.id, |user| {
            user.todos.clear();
            Ok(())
        })
        .commit(&store)
        .unwrap();

    let err = store.entries::<Todo>().delete(&stale, &created.id).unwrap_err();
    assert!(matches!(err, PlannerError::Store(StoreError::NotFound { .. })));
    assert!(store.records::<Todo>().get(&created.id).unwrap().is_none());
}
