//! WriteBatch - Chain document writes into a single store call.
//!
//! ## Example
//!
//! ```ignore
//! WriteBatch::new()
//!     .insert(&todo)
//!     .modify::<User, _>(&user_id, move |user| {
//!         user.todos.push(todo_copy);
//!         Ok(())
//!     })
//!     .commit(&store)?;
//! ```

use thiserror::Error;

use super::{DocumentStore, Record, StoreError, WriteOutcome};

/// Unique `(field, value)` pairs of a document.
pub type UniqueKeys = Vec<(&'static str, String)>;

type ModifyFn = Box<dyn FnOnce(&[u8]) -> Result<(Vec<u8>, UniqueKeys), StoreError> + Send>;

enum OpKind {
    Insert(Vec<u8>),
    Replace(Vec<u8>),
    Remove,
    Modify(ModifyFn),
}

/// One queued write against a single document.
pub struct WriteOp {
    collection: &'static str,
    id: String,
    unique: UniqueKeys,
    require_match: bool,
    kind: OpKind,
}

/// The change a resolved step makes to the stored bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put(Vec<u8>),
    Remove,
    Unchanged,
}

/// A step resolved against the current document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub mutation: Mutation,
    pub outcome: WriteOutcome,
    /// Unique values the document holds after the step.
    pub unique: UniqueKeys,
}

impl WriteOp {
    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Storage key: `"COLLECTION:id"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.collection, self.id)
    }

    /// Work out what this step does to `current`, the bytes stored at
    /// [`WriteOp::key`] right now.
    pub fn resolve(self, current: Option<&[u8]>) -> Result<Resolved, StoreError> {
        let WriteOp {
            collection,
            id,
            unique,
            require_match,
            kind,
        } = self;

        let (next, old, unique) = match (kind, current) {
            (OpKind::Insert(_), Some(_)) => {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    id,
                })
            }
            (OpKind::Insert(bytes), None) => {
                return Ok(Resolved {
                    mutation: Mutation::Put(bytes),
                    outcome: WriteOutcome {
                        matched: false,
                        modified: true,
                    },
                    unique,
                })
            }
            (_, None) if require_match => return Err(StoreError::not_found(collection, &id)),
            (_, None) => {
                return Ok(Resolved {
                    mutation: Mutation::Unchanged,
                    outcome: WriteOutcome::default(),
                    unique: Vec::new(),
                })
            }
            (OpKind::Remove, Some(_)) => {
                return Ok(Resolved {
                    mutation: Mutation::Remove,
                    outcome: WriteOutcome {
                        matched: true,
                        modified: true,
                    },
                    unique: Vec::new(),
                })
            }
            (OpKind::Replace(bytes), Some(old)) => (bytes, old, unique),
            (OpKind::Modify(f), Some(old)) => {
                let (bytes, unique) = f(old)?;
                (bytes, old, unique)
            }
        };

        let modified = next.as_slice() != old;
        Ok(Resolved {
            mutation: if modified {
                Mutation::Put(next)
            } else {
                Mutation::Unchanged
            },
            outcome: WriteOutcome {
                matched: true,
                modified,
            },
            unique,
        })
    }
}

/// A failed batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("write step {step} failed with {applied} step(s) applied: {source}")]
pub struct BatchError {
    /// Index of the step that failed.
    pub step: usize,
    /// Steps that took effect before the failure.
    pub applied: usize,
    pub source: StoreError,
}

/// Builder for chaining several document writes into one store call.
#[derive(Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
    error: Option<StoreError>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new document. Fails if one with the same id exists.
    pub fn insert<M: Record>(self, record: &M) -> Self {
        let unique = record.unique_keys();
        let id = record.id().to_string();
        self.push_encoded(record, |bytes| WriteOp {
            collection: M::COLLECTION,
            id,
            unique,
            require_match: true,
            kind: OpKind::Insert(bytes),
        })
    }

    /// Replace an existing document wholesale.
    pub fn replace<M: Record>(self, record: &M) -> Self {
        let unique = record.unique_keys();
        let id = record.id().to_string();
        self.push_encoded(record, |bytes| WriteOp {
            collection: M::COLLECTION,
            id,
            unique,
            require_match: true,
            kind: OpKind::Replace(bytes),
        })
    }

    /// Remove an existing document.
    pub fn remove<M: Record>(mut self, id: &str) -> Self {
        self.ops.push(WriteOp {
            collection: M::COLLECTION,
            id: id.to_string(),
            unique: Vec::new(),
            require_match: true,
            kind: OpKind::Remove,
        });
        self
    }

    /// Edit an existing document in place.
    ///
    /// The closure sees the document as stored when the step runs, so edits
    /// to embedded arrays do not clobber concurrent edits made elsewhere in
    /// the same document. Changing the document id is rejected.
    pub fn modify<M, F>(mut self, id: &str, f: F) -> Self
    where
        M: Record,
        F: FnOnce(&mut M) -> Result<(), StoreError> + Send + 'static,
    {
        let expected_id = id.to_string();
        let edit: ModifyFn = Box::new(move |bytes| {
            let mut record: M = serde_json::from_slice(bytes)?;
            f(&mut record)?;
            if record.id() != expected_id {
                return Err(StoreError::Storage(format!(
                    "edit changed document id {} to {}",
                    expected_id,
                    record.id()
                )));
            }
            Ok((serde_json::to_vec(&record)?, record.unique_keys()))
        });

        self.ops.push(WriteOp {
            collection: M::COLLECTION,
            id: id.to_string(),
            unique: Vec::new(),
            require_match: true,
            kind: OpKind::Modify(edit),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Hand the queued steps to a store.
    pub fn commit<S: DocumentStore + ?Sized>(
        self,
        store: &S,
    ) -> Result<Vec<WriteOutcome>, BatchError> {
        store.apply_batch(self)
    }

    /// The queued steps, or the first error hit while queueing them.
    pub fn into_ops(self) -> Result<Vec<WriteOp>, StoreError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.ops),
        }
    }

    fn push_encoded<M: Record>(mut self, record: &M, op: impl FnOnce(Vec<u8>) -> WriteOp) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_json::to_vec(record) {
            Ok(bytes) => self.ops.push(op(bytes)),
            Err(err) => self.error = Some(err.into()),
        }
        self
    }
}
