//! Models - Planner records and the per-kind `Entry` description.
//!
//! Every entry kind (todo, sticky, list, event) lives twice: as a canonical
//! record in its own collection, and as an element of the owning
//! [`User`]'s embedded array. [`Entry`] tells the dual-write coordinator how
//! to validate, patch, and locate each kind.

mod event;
mod list;
mod sticky;
mod todo;
mod user;

use serde::de::DeserializeOwned;

use crate::error::PlannerError;
use crate::store::Record;

pub use event::Event;
pub use list::List;
pub use sticky::{Sticky, StickyPatch};
pub use todo::Todo;
pub use user::User;

/// A record kind owned by a user and mirrored into the user document.
pub trait Entry: Record {
    /// Route and command slug, e.g. `"todo"`.
    const KIND: &'static str;
    /// Message prefix, e.g. `"Todo"` in `"Todo Created Successfully"`.
    const LABEL: &'static str;
    /// Body of the empty marker returned when the owner has none.
    const EMPTY_MESSAGE: &'static str;

    /// Update payload.
    type Patch: DeserializeOwned + Clone + Send + 'static;

    fn assign_id(&mut self, id: String);

    /// Required-field check run before create.
    fn validate(&self) -> Result<(), PlannerError>;

    /// Check run before update. Accepts everything unless overridden.
    fn validate_patch(_patch: &Self::Patch) -> Result<(), PlannerError> {
        Ok(())
    }

    /// Apply an update payload. The id never changes.
    fn apply_patch(&mut self, patch: Self::Patch);

    fn embedded(user: &User) -> &Vec<Self>;

    fn embedded_mut(user: &mut User) -> &mut Vec<Self>;
}
