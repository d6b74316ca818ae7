//! Unified error type for Bitbot.

use bitbot_auth::AuthError;
use bitbot_rtm::RtmError;

/// Top-level error that wraps every crate-specific error.
///
/// When using the `bitbot` meta-crate you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BitbotError {
    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// `auth.test` answered `ok: false` for the configured token.
    #[error("token was not accepted by auth.test")]
    TokenNotVerified,

    /// The token check itself failed (HTTP or decode).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The RTM session failed: handshake, dial, or the read loop.
    #[error(transparent)]
    Rtm(#[from] RtmError),
}
