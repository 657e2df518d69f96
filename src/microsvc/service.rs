//! Service - command handler registry and dispatch for microsvc.
//!
//! `Service<S>` holds a store, the token signer and a set of named command
//! handlers. Each handler receives a `Context<S>` and returns
//! `Result<Reply, HandlerError>`.
//!
//! ## Example
//!
//! ```ignore
//! use minimal_planner::microsvc::{Reply, Service, Session};
//! use minimal_planner::models::Todo;
//!
//! let service = Service::new(InMemoryStore::new(), signer)
//!     .entry::<Todo>()
//!     .command("whoami", |ctx| Ok(Reply::ok(json!({ "email": ctx.claims()?.email }))));
//!
//! let reply = service.dispatch("todo.all", json!(null), Session::bearer(&token))?;
//! ```

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::Context;
use super::error::HandlerError;
use super::handlers::entry;
use super::session::Session;
use crate::models::Entry;
use crate::store::DocumentStore;
use crate::token::TokenSigner;

type Guard<S> = Box<dyn Fn(&Context<S>) -> bool + Send + Sync>;
type Handle<S> = Box<dyn Fn(&Context<S>) -> Result<Reply, HandlerError> + Send + Sync>;

/// A registered command handler with optional guard.
struct CommandHandler<S> {
    guard: Option<Guard<S>>,
    handle: Handle<S>,
}

/// Successful handler result: status code and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    /// 200 with `body`.
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// 201 with `body`.
    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }
}

/// A command addressed to the service, e.g. from a queue or a test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub session_variables: HashMap<String, String>,
}

/// Status and body produced for a `CommandRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}

/// A microservice that routes commands to handler functions.
pub struct Service<S> {
    store: S,
    signer: TokenSigner,
    handlers: HashMap<String, CommandHandler<S>>,
    kinds: Vec<&'static str>,
}

impl<S: DocumentStore + 'static> Service<S> {
    /// Create a new service with the given store and token signer.
    pub fn new(store: S, signer: TokenSigner) -> Self {
        Self {
            store,
            signer,
            handlers: HashMap::new(),
            kinds: Vec::new(),
        }
    }

    /// Register a command handler.
    ///
    /// Uses builder pattern - returns `self` for chaining.
    pub fn command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Context<S>) -> Result<Reply, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: None,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register a command handler with a guard function.
    ///
    /// The guard is called before the handler. If it returns `false`,
    /// the command is rejected with `HandlerError::GuardRejected`.
    pub fn command_guarded<G, F>(mut self, name: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&Context<S>) -> bool + Send + Sync + 'static,
        F: Fn(&Context<S>) -> Result<Reply, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: Some(Box::new(guard)),
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register the five commands of an entry kind:
    /// `{kind}.create`, `{kind}.update`, `{kind}.delete`, `{kind}.all` and
    /// `{kind}.get`.
    pub fn entry<K: Entry>(mut self) -> Self {
        self.kinds.push(K::KIND);
        let name = |op: &str| format!("{}.{}", K::KIND, op);
        self.command_guarded(&name("create"), entry::accepts_object::<S>, entry::create::<S, K>)
            .command_guarded(&name("update"), entry::accepts_object::<S>, entry::update::<S, K>)
            .command(&name("delete"), entry::delete::<S, K>)
            .command(&name("all"), entry::all::<S, K>)
            .command(&name("get"), entry::get::<S, K>)
    }

    /// Dispatch a command by name.
    pub fn dispatch(
        &self,
        command: &str,
        input: Value,
        session: Session,
    ) -> Result<Reply, HandlerError> {
        self.dispatch_to(command, None, input, session)
    }

    /// Dispatch a command addressed at one record.
    ///
    /// Builds a `Context` from the input and session, looks up the handler,
    /// runs the guard (if any), then calls the handler.
    pub fn dispatch_to(
        &self,
        command: &str,
        target: Option<&str>,
        input: Value,
        session: Session,
    ) -> Result<Reply, HandlerError> {
        self.run(command, target, input, session, None)
    }

    /// As [`Service::dispatch_to`], failing with `HandlerError::Timeout`
    /// instead of writing once `deadline` has passed.
    pub fn dispatch_before(
        &self,
        command: &str,
        target: Option<&str>,
        input: Value,
        session: Session,
        deadline: Instant,
    ) -> Result<Reply, HandlerError> {
        self.run(command, target, input, session, Some(deadline))
    }

    fn run(
        &self,
        command: &str,
        target: Option<&str>,
        input: Value,
        session: Session,
        deadline: Option<Instant>,
    ) -> Result<Reply, HandlerError> {
        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| HandlerError::UnknownCommand(command.to_string()))?;

        let ctx = Context::new(
            target.map(str::to_string),
            input,
            session,
            deadline,
            &self.store,
            &self.signer,
        );

        // Run guard if present
        if let Some(guard) = &handler.guard {
            if !guard(&ctx) {
                return Err(HandlerError::GuardRejected(command.to_string()));
            }
        }

        (handler.handle)(&ctx)
    }

    /// Dispatch a `CommandRequest`, returning a `CommandResponse`.
    pub fn dispatch_request(&self, request: &CommandRequest) -> CommandResponse {
        let session = Session::from_map(request.session_variables.clone());
        match self.dispatch_to(
            &request.command,
            request.target.as_deref(),
            request.input.clone(),
            session,
        ) {
            Ok(reply) => CommandResponse {
                status: reply.status,
                body: reply.body,
            },
            Err(e) => CommandResponse {
                status: e.status_code(),
                body: serde_json::json!({ "error": e.to_string() }),
            },
        }
    }

    /// List registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Entry kinds registered with [`Service::entry`], in registration order.
    pub fn kinds(&self) -> &[&'static str] {
        &self.kinds
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
