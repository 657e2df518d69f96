use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

use super::provider::{IdentityProvider, ProviderError};
use crate::identity;
use crate::store::{DocumentStore, StoreError};
use crate::token::{TokenError, TokenSigner};

/// OAuth `state` sent with every authorization request.
///
/// Constant and not checked on callback.
pub const OAUTH_STATE: &str = "state-token";

/// Login failure. `Display` is the message shown to the browser.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Code not found")]
    MissingCode,
    #[error("Authentication failed")]
    AuthenticationFailed(#[source] ProviderError),
    #[error("Internal server error")]
    Store(#[source] StoreError),
    #[error("Token generation failed")]
    Token(#[source] TokenError),
    #[error("Authentication timed out")]
    Timeout,
}

impl LoginError {
    pub fn status_code(&self) -> u16 {
        match self {
            LoginError::MissingCode => 400,
            LoginError::AuthenticationFailed(_) => 500,
            LoginError::Store(_) => 500,
            LoginError::Token(_) => 500,
            LoginError::Timeout => 504,
        }
    }
}

const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Authorization code to session credential.
pub struct LoginFlow<S> {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<S>,
    signer: TokenSigner,
    frontend_url: String,
    deadline: Duration,
}

impl<S: DocumentStore + 'static> LoginFlow<S> {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: S,
        signer: TokenSigner,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store: Arc::new(store),
            signer,
            frontend_url: frontend_url.into(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Upper bound on one callback: provider exchange plus registration.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Where to send the browser to start signing in.
    pub fn authorize_url(&self) -> Result<String, LoginError> {
        self.provider
            .authorize_url(OAUTH_STATE)
            .map_err(LoginError::AuthenticationFailed)
    }

    /// Finish sign-in for the callback's `code` and return the frontend URL
    /// carrying the new session token.
    ///
    /// Registration runs on the blocking pool. If it outlives the deadline
    /// the user may still be registered; the next login finds them.
    pub async fn complete(&self, code: Option<&str>) -> Result<String, LoginError> {
        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(LoginError::MissingCode)?;
        let deadline = Instant::now() + self.deadline;

        let identity = match timeout_at(deadline, self.provider.exchange(code)).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(e)) => {
                warn!(error = %e, "identity provider exchange failed");
                return Err(LoginError::AuthenticationFailed(e));
            }
            Err(_) => {
                warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    "identity provider did not answer in time"
                );
                return Err(LoginError::Timeout);
            }
        };

        let store = self.store.clone();
        let candidate = identity.into_user();
        let task = tokio::task::spawn_blocking(move || identity::register(&*store, candidate));
        let user = match timeout_at(deadline, task).await {
            Ok(Ok(Ok(user))) => user,
            Ok(Ok(Err(e))) => {
                error!(error = %e, "failed to store user on login");
                return Err(LoginError::Store(e));
            }
            Ok(Err(join)) => {
                error!(error = %join, "user registration task failed");
                return Err(LoginError::Store(StoreError::Storage(join.to_string())));
            }
            Err(_) => {
                warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    "user registration timed out"
                );
                return Err(LoginError::Timeout);
            }
        };

        let token = self.signer.issue(&user).map_err(LoginError::Token)?;
        info!(user_id = %user.id, "user signed in");

        Ok(format!(
            "{}/home?token={}",
            self.frontend_url.trim_end_matches('/'),
            token
        ))
    }
}
