//! Identity resolution: authenticated email to user document.

use tracing::{debug, info};

use crate::error::PlannerError;
use crate::models::User;
use crate::store::{DocumentStore, RecordsExt, StoreError};

/// Look up the user document for an authenticated email.
pub fn resolve<S: DocumentStore + ?Sized>(store: &S, email: &str) -> Result<User, PlannerError> {
    find_by_email(store, email)?.ok_or(PlannerError::UserNotFound)
}

/// Return the user for `candidate.email`, inserting `candidate` if none
/// exists yet.
///
/// Two logins racing on the same email both reach the insert; the store's
/// unique email key rejects the loser, which then reads the winner's record.
pub fn register<S: DocumentStore + ?Sized>(store: &S, candidate: User) -> Result<User, StoreError> {
    if let Some(existing) = find_by_email(store, &candidate.email)? {
        debug!(email = %existing.email, "user already registered");
        return Ok(existing);
    }

    match store.records::<User>().insert(&candidate) {
        Ok(_) => {
            info!(user_id = %candidate.id, email = %candidate.email, "registered new user");
            Ok(candidate)
        }
        Err(err @ StoreError::DuplicateKey { .. }) => {
            debug!(email = %candidate.email, "lost registration race, re-reading user");
            find_by_email(store, &candidate.email)?.ok_or(err)
        }
        Err(err) => Err(err),
    }
}

fn find_by_email<S: DocumentStore + ?Sized>(
    store: &S,
    email: &str,
) -> Result<Option<User>, StoreError> {
    store.records::<User>().find_unique("email", email)
}
