//! DocumentStore - Abstract document storage.

use serde_json::Value;

use super::{BatchError, StoreError, WriteBatch, WriteOp, WriteOutcome};

/// Abstract document storage, addressed by collection and id.
///
/// Implementations must be safe to share between concurrent requests; the
/// trait is object-safe so the HTTP layer can hold any backend behind an
/// `Arc`.
pub trait DocumentStore: Send + Sync {
    /// Get the stored bytes of a document. Returns None if not found.
    fn get_raw(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// All documents of a collection, in no particular order.
    fn scan_raw(&self, collection: &str) -> Result<Vec<Vec<u8>>, StoreError>;

    /// The document of `collection` whose unique `field` equals `value`.
    ///
    /// The default scans the collection; stores that index unique fields
    /// override it.
    fn find_unique(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        for bytes in self.scan_raw(collection)? {
            let Ok(doc) = serde_json::from_slice::<Value>(&bytes) else {
                continue;
            };
            if field_as_string(&doc, field).as_deref() == Some(value) {
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    /// Apply one write step atomically.
    fn apply(&self, op: WriteOp) -> Result<WriteOutcome, StoreError>;

    /// Apply every step of a batch, in order.
    ///
    /// The default applies steps one by one and stops at the first failure;
    /// steps before it stay applied and `BatchError::applied` says how many.
    /// Stores that support multi-document atomicity override this and report
    /// `applied == 0` on failure.
    fn apply_batch(&self, batch: WriteBatch) -> Result<Vec<WriteOutcome>, BatchError> {
        let ops = batch.into_ops().map_err(|source| BatchError {
            step: 0,
            applied: 0,
            source,
        })?;

        let mut outcomes = Vec::with_capacity(ops.len());
        for (step, op) in ops.into_iter().enumerate() {
            match self.apply(op) {
                Ok(outcome) => outcomes.push(outcome),
                Err(source) => {
                    return Err(BatchError {
                        step,
                        applied: step,
                        source,
                    })
                }
            }
        }
        Ok(outcomes)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn get_raw(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_raw(collection, id)
    }

    fn scan_raw(&self, collection: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        (**self).scan_raw(collection)
    }

    fn find_unique(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).find_unique(collection, field, value)
    }

    fn apply(&self, op: WriteOp) -> Result<WriteOutcome, StoreError> {
        (**self).apply(op)
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<Vec<WriteOutcome>, BatchError> {
        (**self).apply_batch(batch)
    }
}

fn field_as_string(doc: &Value, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
