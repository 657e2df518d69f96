//! Google OAuth 2.0 authorization code flow.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::provider::{ExternalIdentity, IdentityProvider, ProviderError};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Google sign-in client.
pub struct GoogleProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleProvider {
    /// Every call to Google is cut off after `timeout`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
        })
    }
}

/// Token request body for the authorization code grant.
#[derive(Debug, Serialize)]
struct CodeExchangeRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth error response from Google
#[derive(Debug, Deserialize)]
struct GoogleOAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

async fn server_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<GoogleOAuthError>(&body) {
        Ok(err) => ProviderError::Server(format!(
            "{}: {}",
            err.error,
            err.error_description.unwrap_or_default()
        )),
        Err(_) => ProviderError::Server(format!("HTTP {status}: {body}")),
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError> {
        let scope = GOOGLE_SCOPES.join(" ");
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ProviderError> {
        let request = CodeExchangeRequest {
            code,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_url,
            grant_type: "authorization_code",
        };

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let response = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        response
            .json::<ExternalIdentity>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}
