//! Session variables taken from the request headers.

use std::collections::HashMap;

/// Parsed session variables from the incoming request.
///
/// Over HTTP every header becomes a variable under its lowercased name, so
/// the caller's credential is the `authorization` variable:
///
/// ```json
/// { "authorization": "Bearer eyJhbGciOi..." }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from a map of variables.
    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// A session carrying `Authorization: Bearer <token>`.
    pub fn bearer(token: &str) -> Self {
        let mut session = Self::new();
        session.set("authorization", format!("Bearer {token}"));
        session
    }

    /// Raw `authorization` value, prefix included.
    pub fn authorization(&self) -> Option<&str> {
        self.get("authorization")
    }

    /// Get a session variable by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    /// Set a session variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }
}
