//! Store - Document storage for canonical records and user documents.
//!
//! Every record lives in a named collection and is addressed by
//! `"COLLECTION:id"`. Reads go through the typed [`RecordRepository`];
//! writes are expressed as [`WriteBatch`]es so a store that can apply several
//! document writes atomically gets the chance to do so.
//!
//! ## Example
//!
//! ```ignore
//! use minimal_planner::{InMemoryStore, Record, RecordsExt};
//!
//! #[derive(Serialize, Deserialize, Clone, Record)]
//! #[record(collection = "todo")]
//! struct Todo {
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! let store = InMemoryStore::new();
//! store.records::<Todo>().insert(&todo)?;
//! let loaded = store.records::<Todo>().get("t-1")?;
//! ```

mod batch;
mod in_memory;
mod repository;
mod store;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Trait for types that can be stored as documents.
///
/// Usually derived with `#[derive(Record)]`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection name for this record type (e.g., "todo", "user").
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this record.
    fn id(&self) -> &str;

    /// `(field, value)` pairs that must be unique across the collection.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A document with this id already exists.
    #[error("document already exists: {collection}:{id}")]
    Conflict { collection: String, id: String },

    /// A unique field value is already taken by another document.
    #[error("duplicate key on {collection}.{field}: {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    /// A step required a document that does not exist.
    #[error("document not found: {collection}:{id}")]
    NotFound { collection: String, id: String },

    /// Serialization/deserialization error.
    #[error("document serialization error: {0}")]
    Serde(String),

    /// Storage-level error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// What a single write step did.
///
/// Mirrors the matched/modified counts a document database reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// A document existed at the addressed key before the step ran.
    pub matched: bool,
    /// The stored bytes changed.
    pub modified: bool,
}

pub use batch::{BatchError, Mutation, Resolved, UniqueKeys, WriteBatch, WriteOp};
pub use in_memory::InMemoryStore;
pub use repository::{RecordRepository, RecordsExt};
pub use store::DocumentStore;
