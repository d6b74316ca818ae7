//! Token verification hook.
//!
//! Bitbot doesn't decide whether a token is valid, the service does. The
//! [`TokenVerifier`] trait is the single async question "does the service
//! accept this token?", and [`SlackTokenVerifier`] asks it over HTTP.

use std::future::Future;

use bitbot_protocol::{AuthTestResponse, Codec, JsonCodec};

use crate::AuthError;

/// Base URL of the Slack Web API.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Checks an API token with the remote service.
///
/// # Example
///
/// ```rust
/// use bitbot_auth::{AuthError, TokenVerifier};
///
/// /// Accepts a single hard-coded token. Only for tests.
/// struct FixedToken(&'static str);
///
/// impl TokenVerifier for FixedToken {
///     async fn verify(&self, token: &str) -> Result<bool, AuthError> {
///         Ok(token == self.0)
///     }
/// }
/// ```
pub trait TokenVerifier: Send + Sync + 'static {
    /// Returns `Ok(true)` if the service accepts `token`.
    ///
    /// A rejected token is `Ok(false)`; `Err` means the question could not
    /// be asked (network failure, unreadable response).
    fn verify(&self, token: &str) -> impl Future<Output = Result<bool, AuthError>> + Send;
}

/// [`TokenVerifier`] backed by the `auth.test` endpoint.
#[derive(Debug, Clone)]
pub struct SlackTokenVerifier {
    http: reqwest::Client,
    base_url: String,
}

impl SlackTokenVerifier {
    /// Creates a verifier against the production API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }

    /// Creates a verifier against a custom API base URL.
    ///
    /// Trailing slashes are trimmed, so both `https://host/api` and
    /// `https://host/api/` work.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Replaces the HTTP client (for shared connection pools or timeouts).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/auth.test", self.base_url)
    }
}

impl Default for SlackTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenVerifier for SlackTokenVerifier {
    async fn verify(&self, token: &str) -> Result<bool, AuthError> {
        let body = self
            .http
            .get(self.endpoint())
            .query(&[("token", token)])
            .send()
            .await?
            .bytes()
            .await?;

        let response: AuthTestResponse = JsonCodec.decode(&body).map_err(AuthError::Decode)?;
        if response.ok {
            tracing::debug!(
                team = response.team.as_deref().unwrap_or_default(),
                user = response.user.as_deref().unwrap_or_default(),
                "token verified"
            );
        } else {
            tracing::debug!(
                error = response.error.as_deref().unwrap_or_default(),
                "token rejected"
            );
        }
        Ok(response.ok)
    }
}
