//! Context passed to command handlers.
//!
//! Carries the parsed input, the addressed record id, session variables, and
//! references to the store and token signer. Handlers access everything they
//! need through the context.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HandlerError;
use super::session::Session;
use crate::identity;
use crate::models::User;
use crate::store::DocumentStore;
use crate::token::{extract_bearer, Claims, TokenSigner};

/// The context passed to every command handler.
///
/// Generic over `S` (the store type) so handlers work against whatever store
/// the service is configured with.
///
/// ## Example
///
/// ```ignore
/// pub fn handle<S: DocumentStore>(ctx: &Context<S>) -> Result<Reply, HandlerError> {
///     let owner = ctx.owner()?;
///     let input = ctx.input::<Todo>()?;
///     // ...
/// }
/// ```
pub struct Context<'a, S: ?Sized> {
    /// Record id addressed by the request path, if any.
    target: Option<String>,
    /// Raw JSON input from the request.
    input: Value,
    /// Session variables (request headers).
    session: Session,
    /// No writes once this has passed.
    deadline: Option<Instant>,
    store: &'a S,
    signer: &'a TokenSigner,
}

impl<'a, S: DocumentStore + ?Sized> Context<'a, S> {
    pub(crate) fn new(
        target: Option<String>,
        input: Value,
        session: Session,
        deadline: Option<Instant>,
        store: &'a S,
        signer: &'a TokenSigner,
    ) -> Self {
        Self {
            target,
            input,
            session,
            deadline,
            store,
            signer,
        }
    }

    /// Deserialize the input payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.input.clone())
            .map_err(|e| HandlerError::DecodeFailed(e.to_string()))
    }

    /// Get the raw JSON input.
    pub fn raw_input(&self) -> &Value {
        &self.input
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        self.store
    }

    /// Point after which the handler must not write.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The addressed record id: the path id when present, otherwise the
    /// `id` field of the input.
    pub fn target_id(&self) -> Result<String, HandlerError> {
        self.target
            .clone()
            .or_else(|| {
                self.input
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|id| !id.is_empty())
            .ok_or_else(|| HandlerError::Validation("Invalid ID".into()))
    }

    /// Validated claims of the caller's credential.
    pub fn claims(&self) -> Result<Claims, HandlerError> {
        let token = extract_bearer(self.session.authorization())?;
        Ok(self.signer.validate(token)?)
    }

    /// The caller's user document.
    pub fn owner(&self) -> Result<User, HandlerError> {
        let claims = self.claims()?;
        Ok(identity::resolve(self.store, &claims.email)?)
    }
}
