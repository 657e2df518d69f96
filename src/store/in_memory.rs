//! InMemoryStore - HashMap-backed document store for tests and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{
    BatchError, DocumentStore, Mutation, StoreError, UniqueKeys, WriteBatch, WriteOp,
    WriteOutcome,
};

/// In-memory document store backed by a HashMap.
///
/// Storage key is `"COLLECTION:id"`. Clone-friendly via Arc. Batches are
/// applied under one write lock, so either every step lands or none does.
/// Unique field values are indexed, so uniqueness checks and
/// [`DocumentStore::find_unique`] do not scan the collection.
#[derive(Clone)]
pub struct InMemoryStore {
    storage: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    docs: HashMap<String, Vec<u8>>,
    /// `"COLLECTION:field:value"` to the key of the document holding it.
    unique: HashMap<String, String>,
    /// Document key to the index entries it holds.
    claims: HashMap<String, Vec<String>>,
}

impl Tables {
    fn release(&mut self, key: &str) {
        for entry in self.claims.remove(key).unwrap_or_default() {
            if self.unique.get(&entry).map(String::as_str) == Some(key) {
                self.unique.remove(&entry);
            }
        }
    }
}

struct Staged {
    bytes: Vec<u8>,
    unique: Vec<String>,
}

/// Writes staged by a batch that has not been committed yet.
/// `None` marks a removal.
type Overlay = HashMap<String, Option<Staged>>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn index_key(collection: &str, field: &str, value: &str) -> String {
    format!("{}:{}:{}", collection, field, value)
}

fn poisoned() -> StoreError {
    StoreError::Storage("lock poisoned".into())
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Tables::default())),
        }
    }

    fn make_key(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self.scan_raw(collection)?.len())
    }

    fn stage(
        tables: &Tables,
        overlay: &mut Overlay,
        op: WriteOp,
    ) -> Result<WriteOutcome, StoreError> {
        let key = op.key();
        let collection = op.collection();

        let current = match overlay.get(&key) {
            Some(staged) => staged.as_ref().map(|s| s.bytes.clone()),
            None => tables.docs.get(&key).cloned(),
        };

        let resolved = op.resolve(current.as_deref())?;
        match resolved.mutation {
            Mutation::Put(bytes) => {
                let unique = check_unique(tables, overlay, collection, &key, &resolved.unique)?;
                overlay.insert(key, Some(Staged { bytes, unique }));
            }
            Mutation::Remove => {
                overlay.insert(key, None);
            }
            Mutation::Unchanged => {}
        }
        Ok(resolved.outcome)
    }

    fn commit(tables: &mut Tables, overlay: Overlay) {
        for (key, staged) in overlay {
            tables.release(&key);
            match staged {
                Some(Staged { bytes, unique }) => {
                    for entry in &unique {
                        tables.unique.insert(entry.clone(), key.clone());
                    }
                    tables.claims.insert(key.clone(), unique);
                    tables.docs.insert(key, bytes);
                }
                None => {
                    tables.docs.remove(&key);
                }
            }
        }
    }
}

/// Reject the write if another document of the collection already holds one
/// of the unique values. Returns the index entries the write will hold.
fn check_unique(
    tables: &Tables,
    overlay: &Overlay,
    collection: &str,
    own_key: &str,
    unique: &UniqueKeys,
) -> Result<Vec<String>, StoreError> {
    let mut entries = Vec::with_capacity(unique.len());
    for (field, value) in unique {
        let entry = index_key(collection, field, value);

        let staged_holder = overlay.iter().any(|(key, staged)| {
            key != own_key && staged.as_ref().is_some_and(|s| s.unique.contains(&entry))
        });
        let committed_holder = tables
            .unique
            .get(&entry)
            .is_some_and(|key| key != own_key && !overlay.contains_key(key));

        if staged_holder || committed_holder {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                field: field.to_string(),
                value: value.clone(),
            });
        }
        entries.push(entry);
    }
    Ok(entries)
}

impl DocumentStore for InMemoryStore {
    fn get_raw(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = Self::make_key(collection, id);
        let tables = self.storage.read().map_err(|_| poisoned())?;

        Ok(tables.docs.get(&key).cloned())
    }

    fn scan_raw(&self, collection: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let tables = self.storage.read().map_err(|_| poisoned())?;

        let prefix = format!("{}:", collection);
        Ok(tables
            .docs
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, bytes)| bytes.clone())
            .collect())
    }

    fn find_unique(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let tables = self.storage.read().map_err(|_| poisoned())?;

        Ok(tables
            .unique
            .get(&index_key(collection, field, value))
            .and_then(|key| tables.docs.get(key))
            .cloned())
    }

    fn apply(&self, op: WriteOp) -> Result<WriteOutcome, StoreError> {
        let mut tables = self.storage.write().map_err(|_| poisoned())?;

        let mut overlay = Overlay::new();
        let outcome = Self::stage(&tables, &mut overlay, op)?;
        Self::commit(&mut tables, overlay);
        Ok(outcome)
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<Vec<WriteOutcome>, BatchError> {
        let ops = batch.into_ops().map_err(|source| BatchError {
            step: 0,
            applied: 0,
            source,
        })?;

        let mut tables = self.storage.write().map_err(|_| BatchError {
            step: 0,
            applied: 0,
            source: poisoned(),
        })?;

        let mut overlay = Overlay::new();
        let mut outcomes = Vec::with_capacity(ops.len());
        for (step, op) in ops.into_iter().enumerate() {
            let outcome = Self::stage(&tables, &mut overlay, op).map_err(|source| BatchError {
                step,
                applied: 0,
                source,
            })?;
            outcomes.push(outcome);
        }

        Self::commit(&mut tables, overlay);
        Ok(outcomes)
    }
}
