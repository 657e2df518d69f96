//! Handler: user.get
//!
//! Returns the caller's user document, embedded arrays included.

use crate::microsvc::{Context, HandlerError, Reply};
use crate::store::DocumentStore;

pub const COMMAND: &str = "user.get";

/// Takes no payload.
pub fn guard<S: DocumentStore + ?Sized>(ctx: &Context<S>) -> bool {
    ctx.raw_input().is_null() || ctx.raw_input().is_object()
}

pub fn handle<S: DocumentStore + ?Sized>(ctx: &Context<S>) -> Result<Reply, HandlerError> {
    let user = ctx.owner()?;
    Ok(Reply::ok(serde_json::to_value(user).map_err(|e| HandlerError::Other(Box::new(e)))?))
}
