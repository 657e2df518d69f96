use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::User;

/// Identity attributes asserted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalIdentity {
    /// Provider subject id. Becomes the user id on first login.
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

impl ExternalIdentity {
    /// A new user document for this identity, embedded arrays empty.
    pub fn into_user(self) -> User {
        User::new(self.id, self.name, self.email, self.picture)
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider configuration error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("provider rejected the request: {0}")]
    Server(String),
    #[error("unreadable provider response: {0}")]
    Parse(String),
}

/// An OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to for consent.
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError>;

    /// Exchange an authorization code for the signed-in identity.
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ProviderError>;
}
