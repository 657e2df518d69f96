//! Personal planner backend: todos, sticky notes, lists and calendar events
//! behind Google sign-in.
//!
//! Each entry is stored in its own collection and copied into the owning
//! user's document; [`dual_write`] keeps the two in step and
//! [`microsvc`] exposes everything as commands and HTTP routes.

// Lets `#[derive(Record)]` expand to `::minimal_planner::Record` inside this
// crate too.
extern crate self as minimal_planner;

pub mod config;
pub mod dual_write;
pub mod error;
pub mod identity;
pub mod login;
pub mod microsvc;
pub mod models;
pub mod store;
pub mod token;

pub use config::{AppConfig, ConfigError, GoogleConfig};
pub use dual_write::{DualWrite, EntriesExt, Listing, UpdateSummary};
pub use error::PlannerError;
pub use models::{Entry, Event, List, Sticky, StickyPatch, Todo, User};
pub use store::{
    BatchError, DocumentStore, InMemoryStore, Record, RecordRepository, RecordsExt, StoreError,
    WriteBatch, WriteOp, WriteOutcome,
};
pub use token::{Claims, TokenError, TokenSigner};

// Re-export the derive macro alongside the trait it implements.
pub use planner_macros::Record;
