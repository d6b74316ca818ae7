//! Error types for token verification.

/// Errors that can occur while verifying a token.
///
/// A token the service rejects is not an error: it is reported as
/// `Ok(false)` by [`TokenVerifier::verify`](crate::TokenVerifier::verify).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The HTTP request to the verification endpoint failed. The request
    /// URL is stripped because it carries the token.
    #[error("auth request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The endpoint answered with a body that is not an `auth.test` response.
    #[error("auth response could not be decoded: {0}")]
    Decode(#[source] bitbot_protocol::ProtocolError),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
