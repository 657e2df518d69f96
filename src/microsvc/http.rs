//! HTTP transport for microsvc - maps HTTP requests to command dispatch.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! For every registered entry kind `{k}`:
//!
//! - `POST /create-{k}` → `{k}.create`
//! - `GET /all-{k}` → `{k}.all`
//! - `PUT /update-{k}/:id`, `PUT /update-{k}` (id in body) → `{k}.update`
//! - `DELETE /delete-{k}/:id`, `DELETE /delete-{k}` (id in body) → `{k}.delete`
//!
//! Plus `GET /lists/:id` → `list.get`, `GET /auth/user` → `user.get`,
//! `POST /commands/:command` for any command, `GET /health`, and the Google
//! sign-in routes when a [`LoginFlow`] is attached.
//!
//! Dispatch runs on the blocking pool and is bounded by the request deadline;
//! a request that outlives it answers 504. The same deadline travels into
//! the dispatch, so a handler still running after the 504 does not write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{MatchedPath, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post, put, MethodRouter};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::warn;

use super::error::HandlerError;
use super::service::{Reply, Service};
use super::session::Session;
use crate::login::LoginFlow;
use crate::store::DocumentStore;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Everything the HTTP handlers share.
pub struct HttpState<S> {
    service: Arc<Service<S>>,
    login: Option<Arc<LoginFlow<S>>>,
    deadline: Duration,
    routes: Arc<HashMap<String, String>>,
}

impl<S> Clone for HttpState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            login: self.login.clone(),
            deadline: self.deadline,
            routes: self.routes.clone(),
        }
    }
}

impl<S> HttpState<S> {
    pub fn new(service: Arc<Service<S>>) -> Self {
        Self {
            service,
            login: None,
            deadline: DEFAULT_DEADLINE,
            routes: Arc::new(HashMap::new()),
        }
    }

    /// Serve the Google sign-in routes through `flow`.
    pub fn with_login(mut self, flow: Arc<LoginFlow<S>>) -> Self {
        self.login = Some(flow);
        self
    }

    /// Upper bound on a single dispatch.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

#[derive(Clone, Copy)]
enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

fn entry_routes(kind: &str) -> Vec<(Verb, String, String)> {
    let create = format!("{kind}.create");
    let update = format!("{kind}.update");
    let remove = format!("{kind}.delete");
    vec![
        (Verb::Post, format!("/create-{kind}"), create),
        (Verb::Get, format!("/all-{kind}"), format!("{kind}.all")),
        (Verb::Put, format!("/update-{kind}"), update.clone()),
        (Verb::Put, format!("/update-{kind}/:id"), update),
        (Verb::Delete, format!("/delete-{kind}"), remove.clone()),
        (Verb::Delete, format!("/delete-{kind}/:id"), remove),
    ]
}

fn on<S: DocumentStore + 'static>(verb: Verb) -> MethodRouter<HttpState<S>> {
    match verb {
        Verb::Get => get(route_handler::<S>),
        Verb::Post => post(route_handler::<S>),
        Verb::Put => put(route_handler::<S>),
        Verb::Delete => delete(route_handler::<S>),
    }
}

/// Build an axum `Router` that dispatches commands via the given service.
pub fn router<S: DocumentStore + 'static>(state: HttpState<S>) -> Router {
    let mut table: Vec<(Verb, String, String)> = state
        .service
        .kinds()
        .iter()
        .flat_map(|kind| entry_routes(kind))
        .collect();
    if state.service.kinds().contains(&"list") {
        table.push((Verb::Get, "/lists/:id".into(), "list.get".into()));
    }
    table.push((Verb::Get, "/auth/user".into(), "user.get".into()));

    let mut app = Router::new()
        .route("/health", get(health_handler::<S>))
        .route("/commands/:command", post(command_handler::<S>));

    let mut routes = HashMap::new();
    for (verb, pattern, command) in table {
        app = app.route(&pattern, on::<S>(verb));
        routes.insert(pattern, command);
    }

    if state.login.is_some() {
        app = app
            .route("/auth/google/login", get(login_handler::<S>))
            .route("/auth/google/callback", get(callback_handler::<S>));
    }

    let state = HttpState {
        routes: Arc::new(routes),
        ..state
    };
    app.with_state(state)
}

/// Serve over HTTP at the given address (e.g. `"0.0.0.0:8000"`).
pub async fn serve<S: DocumentStore + 'static>(
    state: HttpState<S>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// `GET /health` - returns `{ "ok": true, "commands": [...] }`.
async fn health_handler<S: DocumentStore + 'static>(
    State(state): State<HttpState<S>>,
) -> impl IntoResponse {
    let commands: Vec<&str> = state.service.commands();
    Json(json!({ "ok": true, "commands": commands }))
}

/// `POST /commands/:command` - dispatch any command with JSON body and
/// headers as session.
async fn command_handler<S: DocumentStore + 'static>(
    State(state): State<HttpState<S>>,
    Path(command): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run(state, command, None, headers, body).await
}

/// Planner routes: the matched pattern names the command.
async fn route_handler<S: DocumentStore + 'static>(
    State(state): State<HttpState<S>>,
    matched: MatchedPath,
    id: Option<Path<String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(command) = state.routes.get(matched.as_str()).cloned() else {
        return error_response(&HandlerError::UnknownCommand(matched.as_str().to_string()));
    };
    run(state, command, id.map(|Path(id)| id), headers, body).await
}

async fn run<S: DocumentStore + 'static>(
    state: HttpState<S>,
    command: String,
    target: Option<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let input = match parse_body(&body) {
        Ok(input) => input,
        Err(e) => return error_response(&e),
    };
    let session = session_from_headers(&headers);

    let service = state.service.clone();
    let name = command.clone();
    let deadline = Instant::now() + state.deadline;
    let task = tokio::task::spawn_blocking(move || {
        service.dispatch_before(&name, target.as_deref(), input, session, deadline)
    });

    let result = match tokio::time::timeout(state.deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(HandlerError::Other(Box::new(join))),
        Err(_) => {
            warn!(command = %command, deadline_ms = state.deadline.as_millis() as u64, "command timed out");
            Err(HandlerError::Timeout)
        }
    };

    match result {
        Ok(reply) => reply_response(reply),
        Err(e) => error_response(&e),
    }
}

/// `GET /auth/google/login` - redirect to the provider's consent page.
async fn login_handler<S: DocumentStore + 'static>(
    State(state): State<HttpState<S>>,
) -> Response {
    let Some(flow) = &state.login else {
        return error_response(&HandlerError::UnknownCommand("login".into()));
    };
    match flow.authorize_url() {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => message_response(e.status_code(), &e.to_string()),
    }
}

/// `GET /auth/google/callback?code=...` - finish sign-in and redirect to the
/// frontend with the session token.
async fn callback_handler<S: DocumentStore + 'static>(
    State(state): State<HttpState<S>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(flow) = &state.login else {
        return error_response(&HandlerError::UnknownCommand("login".into()));
    };
    match flow.complete(params.get("code").map(String::as_str)).await {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => message_response(e.status_code(), &e.to_string()),
    }
}

/// An empty body is `null`; anything else must be JSON.
fn parse_body(body: &Bytes) -> Result<Value, HandlerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| HandlerError::DecodeFailed(format!("Invalid JSON format: {e}")))
}

fn reply_response(reply: Reply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    (status, Json(reply.body)).into_response()
}

fn error_response(e: &HandlerError) -> Response {
    message_response(e.status_code(), &e.to_string())
}

fn message_response(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": message }))).into_response()
}

/// Extract session variables from HTTP headers.
///
/// All headers are lowercased and included as session variables.
fn session_from_headers(headers: &HeaderMap) -> Session {
    let mut vars = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            vars.insert(name.as_str().to_string(), v.to_string());
        }
    }
    Session::from_map(vars)
}
