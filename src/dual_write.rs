//! Dual-write coordinator.
//!
//! Every entry lives in its own collection and, as a full copy, inside the
//! owner's user document. Each mutation here writes both places through one
//! [`WriteBatch`]: [`InMemoryStore`](crate::InMemoryStore) applies it
//! all-or-nothing, a step-by-step store may stop half way and the divergence
//! is logged and reported as an error.
//!
//! ```ignore
//! let owner = identity::resolve(&store, &claims.email)?;
//! let todo = store.entries::<Todo>().create(&owner, payload)?;
//! ```

use std::marker::PhantomData;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::PlannerError;
use crate::models::{Entry, User};
use crate::store::{BatchError, DocumentStore, StoreError, WriteBatch};

/// Result of a listing: the owner's entries, or nothing at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<K> {
    Items(Vec<K>),
    Empty,
}

/// Counts reported by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    /// 1 when the canonical record was found.
    pub matched: u64,
    /// 1 when its stored content changed.
    pub updated: u64,
}

/// Dual-write operations for one entry kind.
pub struct DualWrite<'a, S: ?Sized, K> {
    store: &'a S,
    deadline: Option<Instant>,
    _marker: PhantomData<K>,
}

impl<'a, S: DocumentStore + ?Sized, K: Entry> DualWrite<'a, S, K> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            deadline: None,
            _marker: PhantomData,
        }
    }

    /// Refuse to commit once `deadline` has passed. A write that would land
    /// after its caller gave up fails with `Timeout` and leaves both copies
    /// untouched.
    pub fn before(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Validate `entry`, give it a fresh id, store it and append the same
    /// record to the owner's embedded array.
    pub fn create(&self, owner: &User, mut entry: K) -> Result<K, PlannerError> {
        entry.validate()?;
        entry.assign_id(Uuid::new_v4().to_string());

        let embedded = entry.clone();
        let batch = WriteBatch::new()
            .insert(&entry)
            .modify::<User, _>(&owner.id, move |user| {
                K::embedded_mut(user).push(embedded);
                Ok(())
            });

        self.in_time("create", entry.id())?;
        batch
            .commit(self.store)
            .map_err(|err| self.failed("create", entry.id(), err, |source| source.into()))?;

        debug!(kind = K::KIND, id = entry.id(), owner = %owner.id, "created entry");
        Ok(entry)
    }

    /// Apply `patch` to the canonical record and to the owner's embedded copy.
    pub fn update(
        &self,
        owner: &User,
        id: &str,
        patch: K::Patch,
    ) -> Result<UpdateSummary, PlannerError> {
        K::validate_patch(&patch)?;
        self.owned(owner, id)?;

        let canonical_patch = patch.clone();
        let target = id.to_string();
        let batch = WriteBatch::new()
            .modify::<K, _>(id, move |record| {
                record.apply_patch(canonical_patch);
                Ok(())
            })
            .modify::<User, _>(&owner.id, move |user| {
                let slot = K::embedded_mut(user)
                    .iter_mut()
                    .find(|entry| entry.id() == target)
                    .ok_or_else(|| StoreError::not_found(K::COLLECTION, &target))?;
                slot.apply_patch(patch);
                Ok(())
            });

        self.in_time("update", id)?;
        let outcomes = batch.commit(self.store).map_err(|err| {
            self.failed("update", id, err, |source| match source {
                StoreError::NotFound { .. } => PlannerError::not_found(K::LABEL),
                other => other.into(),
            })
        })?;

        let canonical = outcomes.first().copied().unwrap_or_default();
        debug!(kind = K::KIND, id, modified = canonical.modified, "updated entry");
        Ok(UpdateSummary {
            matched: u64::from(canonical.matched),
            updated: u64::from(canonical.modified),
        })
    }

    /// Remove the canonical record and pull its copy from the owner.
    ///
    /// Only the owner's own entries can be removed; the pull step fails when
    /// the element is gone from the owner document by the time it runs.
    pub fn delete(&self, owner: &User, id: &str) -> Result<(), PlannerError> {
        self.owned(owner, id)?;

        let target = id.to_string();
        let batch = WriteBatch::new()
            .remove::<K>(id)
            .modify::<User, _>(&owner.id, move |user| {
                let entries = K::embedded_mut(user);
                let before = entries.len();
                entries.retain(|entry| entry.id() != target);
                if entries.len() == before {
                    return Err(StoreError::not_found(K::COLLECTION, &target));
                }
                Ok(())
            });

        self.in_time("delete", id)?;
        batch.commit(self.store).map_err(|err| {
            let rolled_back = err.applied == 0;
            self.failed("delete", id, err, |source| match source {
                StoreError::NotFound { .. } if rolled_back => PlannerError::not_found(K::LABEL),
                other => other.into(),
            })
        })?;

        debug!(kind = K::KIND, id, owner = %owner.id, "deleted entry");
        Ok(())
    }

    /// The owner's entries of this kind, read from the embedded array.
    pub fn list_all(&self, owner: &User) -> Listing<K> {
        let items = K::embedded(owner);
        if items.is_empty() {
            Listing::Empty
        } else {
            Listing::Items(items.clone())
        }
    }

    /// One of the owner's entries by id.
    pub fn get(&self, owner: &User, id: &str) -> Result<K, PlannerError> {
        K::embedded(owner)
            .iter()
            .find(|entry| entry.id() == id)
            .cloned()
            .ok_or_else(|| PlannerError::not_found(K::LABEL))
    }

    fn in_time(&self, op: &'static str, id: &str) -> Result<(), PlannerError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                warn!(kind = K::KIND, op, id, "deadline passed before commit; nothing written");
                Err(PlannerError::Timeout)
            }
            _ => Ok(()),
        }
    }

    /// `NotFound` unless `id` is in the owner's embedded array.
    fn owned(&self, owner: &User, id: &str) -> Result<(), PlannerError> {
        if K::embedded(owner).iter().any(|entry| entry.id() == id) {
            Ok(())
        } else {
            Err(PlannerError::not_found(K::LABEL))
        }
    }

    fn failed(
        &self,
        op: &'static str,
        id: &str,
        err: BatchError,
        map: impl FnOnce(StoreError) -> PlannerError,
    ) -> PlannerError {
        if err.applied > 0 {
            warn!(
                kind = K::KIND,
                op,
                id,
                step = err.step,
                applied = err.applied,
                error = %err.source,
                "dual write partially applied; canonical and embedded copies diverge"
            );
        } else {
            debug!(kind = K::KIND, op, id, error = %err.source, "dual write rejected");
        }
        map(err.source)
    }
}

/// Extension trait for dual-write access on any DocumentStore.
pub trait EntriesExt: DocumentStore {
    fn entries<K: Entry>(&self) -> DualWrite<'_, Self, K> {
        DualWrite::new(self)
    }
}

impl<S: DocumentStore + ?Sized> EntriesExt for S {}
