//! RecordRepository - Typed accessor for record CRUD operations.

use std::marker::PhantomData;

use super::{DocumentStore, Record, StoreError, WriteBatch, WriteOutcome};

/// Typed repository wrapper for accessing records of a specific type.
pub struct RecordRepository<'a, S: ?Sized, M> {
    store: &'a S,
    _marker: PhantomData<M>,
}

impl<'a, S: DocumentStore + ?Sized, M: Record> RecordRepository<'a, S, M> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Result<Option<M>, StoreError> {
        match self.store.get_raw(M::COLLECTION, id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert a new record. Fails if it already exists.
    pub fn insert(&self, record: &M) -> Result<WriteOutcome, StoreError> {
        self.single(WriteBatch::new().insert(record))
    }

    /// Replace an existing record. Fails if it does not exist.
    pub fn replace(&self, record: &M) -> Result<WriteOutcome, StoreError> {
        self.single(WriteBatch::new().replace(record))
    }

    /// Delete a record by ID. Returns true if it existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        match self.single(WriteBatch::new().remove::<M>(id)) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Every record of the collection. Documents that no longer decode as
    /// `M` are skipped.
    pub fn all(&self) -> Result<Vec<M>, StoreError> {
        self.find(&|_| true)
    }

    /// Find records matching a predicate.
    pub fn find(&self, predicate: &dyn Fn(&M) -> bool) -> Result<Vec<M>, StoreError> {
        let mut results = Vec::new();
        for bytes in self.store.scan_raw(M::COLLECTION)? {
            if let Ok(record) = serde_json::from_slice::<M>(&bytes) {
                if predicate(&record) {
                    results.push(record);
                }
            }
        }
        Ok(results)
    }

    /// The record whose unique `field` equals `value`.
    pub fn find_unique(&self, field: &str, value: &str) -> Result<Option<M>, StoreError> {
        match self.store.find_unique(M::COLLECTION, field, value)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn single(&self, batch: WriteBatch) -> Result<WriteOutcome, StoreError> {
        let outcomes = batch.commit(self.store).map_err(|err| err.source)?;
        Ok(outcomes.into_iter().next().unwrap_or_default())
    }
}

/// Extension trait for typed record access on any DocumentStore.
pub trait RecordsExt: DocumentStore {
    /// Get a typed record repository.
    fn records<M: Record>(&self) -> RecordRepository<'_, Self, M> {
        RecordRepository::new(self)
    }
}

impl<S: DocumentStore + ?Sized> RecordsExt for S {}
