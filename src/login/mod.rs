//! Login - Google OAuth sign-in that ends in a session credential.
//!
//! The provider turns an authorization code into an [`ExternalIdentity`];
//! [`LoginFlow`] registers that identity as a user (once per email) and
//! issues the token the frontend uses as its bearer credential.

#[cfg(feature = "http")]
mod flow;
#[cfg(feature = "http")]
mod google;
mod provider;

#[cfg(feature = "http")]
pub use flow::{LoginError, LoginFlow, OAUTH_STATE};
#[cfg(feature = "http")]
pub use google::GoogleProvider;
pub use provider::{ExternalIdentity, IdentityProvider, ProviderError};
