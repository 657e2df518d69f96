//! Generic handlers for the entry kinds.
//!
//! Every handler resolves the caller first, so a request fails with 401 for
//! a bad credential, then 404 for an unknown user, before its payload is
//! looked at.

use serde::Serialize;
use serde_json::{json, Value};

use crate::dual_write::{EntriesExt, Listing};
use crate::microsvc::{Context, HandlerError, Reply};
use crate::models::Entry;
use crate::store::DocumentStore;

/// Guard for commands that take a JSON object payload.
pub fn accepts_object<S: DocumentStore + ?Sized>(ctx: &Context<S>) -> bool {
    ctx.raw_input().is_object()
}

pub fn create<S: DocumentStore + ?Sized, K: Entry>(
    ctx: &Context<S>,
) -> Result<Reply, HandlerError> {
    let owner = ctx.owner()?;
    let payload = ctx.input::<K>()?;
    let created = ctx
        .store()
        .entries::<K>()
        .before(ctx.deadline())
        .create(&owner, payload)?;

    Ok(Reply::created(json!({
        "message": format!("{} Created Successfully", K::LABEL),
        "id": created.id(),
    })))
}

pub fn update<S: DocumentStore + ?Sized, K: Entry>(
    ctx: &Context<S>,
) -> Result<Reply, HandlerError> {
    let owner = ctx.owner()?;
    let id = ctx.target_id()?;
    let patch = ctx.input::<K::Patch>()?;
    let summary = ctx
        .store()
        .entries::<K>()
        .before(ctx.deadline())
        .update(&owner, &id, patch)?;

    Ok(Reply::ok(json!({
        "message": format!("{} updated successfully", K::LABEL),
        "matched": summary.matched,
        "updated": summary.updated,
    })))
}

pub fn delete<S: DocumentStore + ?Sized, K: Entry>(
    ctx: &Context<S>,
) -> Result<Reply, HandlerError> {
    let owner = ctx.owner()?;
    let id = ctx.target_id()?;
    ctx.store()
        .entries::<K>()
        .before(ctx.deadline())
        .delete(&owner, &id)?;

    Ok(Reply::ok(json!({
        "message": format!("{} Deleted Successfully", K::LABEL),
    })))
}

pub fn all<S: DocumentStore + ?Sized, K: Entry>(ctx: &Context<S>) -> Result<Reply, HandlerError> {
    let owner = ctx.owner()?;
    match ctx.store().entries::<K>().list_all(&owner) {
        Listing::Items(items) => Ok(Reply::ok(to_body(&items)?)),
        Listing::Empty => Ok(Reply::ok(json!({ "message": K::EMPTY_MESSAGE }))),
    }
}

pub fn get<S: DocumentStore + ?Sized, K: Entry>(ctx: &Context<S>) -> Result<Reply, HandlerError> {
    let owner = ctx.owner()?;
    let id = ctx.target_id()?;
    let entry = ctx.store().entries::<K>().get(&owner, &id)?;
    Ok(Reply::ok(to_body(&entry)?))
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, HandlerError> {
    serde_json::to_value(value).map_err(|e| HandlerError::Other(Box::new(e)))
}
