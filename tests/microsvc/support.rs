//! Shared fixtures: a planner service with one registered user.

use std::sync::Arc;

use minimal_planner::microsvc::{self, Service, Session};
use minimal_planner::{InMemoryStore, RecordsExt, TokenSigner, User};

pub const SECRET: &str = "test-secret";

pub struct Fixture {
    pub service: Arc<Service<InMemoryStore>>,
    pub store: InMemoryStore,
    pub token: String,
}

impl Fixture {
    pub fn session(&self) -> Session {
        Session::bearer(&self.token)
    }
}

pub fn ann() -> User {
    User::new("u-ann", "Ann", "a@example.com", "https://example.com/ann.png")
}

/// Planner service over a fresh store holding `ann()`, plus her token.
pub fn planner() -> Fixture {
    let store = InMemoryStore::new();
    let signer = TokenSigner::new(SECRET);
    let user = ann();
    store.records::<User>().insert(&user).unwrap();
    let token = signer.issue(&user).unwrap();

    Fixture {
        service: Arc::new(microsvc::planner(store.clone(), signer)),
        store,
        token,
    }
}

/// A valid token for an email with no user document.
pub fn stranger_token() -> String {
    TokenSigner::new(SECRET)
        .issue(&User::new("u-ghost", "Ghost", "ghost@example.com", ""))
        .unwrap()
}

/// Store whose reads take longer than any test deadline.
pub struct SlowStore {
    pub inner: InMemoryStore,
    pub delay: std::time::Duration,
}

impl minimal_planner::DocumentStore for SlowStore {
    fn get_raw(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Vec<u8>>, minimal_planner::StoreError> {
        std::thread::sleep(self.delay);
        self.inner.get_raw(collection, id)
    }

    fn scan_raw(&self, collection: &str) -> Result<Vec<Vec<u8>>, minimal_planner::StoreError> {
        std::thread::sleep(self.delay);
        self.inner.scan_raw(collection)
    }

    fn apply(
        &self,
        op: minimal_planner::WriteOp,
    ) -> Result<minimal_planner::WriteOutcome, minimal_planner::StoreError> {
        self.inner.apply(op)
    }
}

/// Register a second user and return their token.
pub fn second_user(fx: &Fixture) -> String {
    let bob = User::new("u-bob", "Bob", "b@example.com", "");
    fx.store.records::<User>().insert(&bob).unwrap();
    TokenSigner::new(SECRET).issue(&bob).unwrap()
}
