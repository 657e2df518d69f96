//! microsvc - Convention-based command handler framework for the planner.
//!
//! Every operation is a named command registered on a `Service`. Each
//! handler receives a `Context<S>` with access to the input payload, the
//! addressed record id, session variables, and the store.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use minimal_planner::{microsvc, InMemoryStore, TokenSigner};
//! use serde_json::json;
//!
//! let service = Arc::new(microsvc::planner(InMemoryStore::new(), TokenSigner::new(secret)));
//!
//! // Direct dispatch
//! let reply = service.dispatch(
//!     "todo.create",
//!     json!({ "name": "Buy milk" }),
//!     microsvc::Session::bearer(&token),
//! )?;
//!
//! // HTTP transport (requires "http" feature)
//! // microsvc::serve(microsvc::HttpState::new(service), "0.0.0.0:8000").await?;
//! ```
//!
//! ## Handler Convention
//!
//! Single-command handlers live in their own module:
//!
//! ```ignore
//! pub const COMMAND: &str = "user.get";
//!
//! pub fn guard<S: DocumentStore + ?Sized>(ctx: &Context<S>) -> bool {
//!     ctx.raw_input().is_null() || ctx.raw_input().is_object()
//! }
//!
//! pub fn handle<S: DocumentStore + ?Sized>(ctx: &Context<S>) -> Result<Reply, HandlerError> {
//!     let user = ctx.owner()?;
//!     Ok(Reply::ok(serde_json::to_value(user)?))
//! }
//! ```

mod context;
mod error;
pub mod handlers;
mod service;
mod session;

pub use context::Context;
pub use error::HandlerError;
pub use service::{CommandRequest, CommandResponse, Reply, Service};
pub use session::Session;

// HTTP transport (requires "http" feature)
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{router, serve, HttpState};

use crate::models::{Event, List, Sticky, Todo};
use crate::store::DocumentStore;
use crate::token::TokenSigner;

/// Register handler modules with a service using the convention pattern.
///
/// Each handler module must export:
/// - `COMMAND: &str` - the command name
/// - `guard(ctx) -> bool` - input validation
/// - `handle(ctx) -> Result<Reply, HandlerError>` - the handler
///
/// # Example
/// ```ignore
/// let service = minimal_planner::register_handlers!(
///     microsvc::Service::new(InMemoryStore::new(), signer),
///     handlers::user_get,
/// );
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .command_guarded(
                $($seg)::+::COMMAND,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}

/// The planner service: `user.get` plus the commands of every entry kind.
pub fn planner<S: DocumentStore + 'static>(store: S, signer: TokenSigner) -> Service<S> {
    crate::register_handlers!(Service::new(store, signer), handlers::user_get)
        .entry::<Todo>()
        .entry::<Sticky>()
        .entry::<List>()
        .entry::<Event>()
}
