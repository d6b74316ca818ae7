//! Error types for the RTM layer.

use bitbot_protocol::ProtocolError;
use bitbot_transport::TransportError;

/// Errors that end an RTM session or fail a write.
///
/// Frame decode failures and handler panics never show up here: they are
/// recovered inside the read loop so one bad frame or handler cannot take
/// the connection down.
#[derive(Debug, thiserror::Error)]
pub enum RtmError {
    /// The service declined to start a session. Carries the service's
    /// error text (e.g. `invalid_auth`).
    #[error("RTM API was not OK to start stream: {0}")]
    HandshakeRejected(String),

    /// The `rtm.start` request itself failed. The request URL is stripped
    /// because it carries the token.
    #[error("rtm.start request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// Socket dial, read, or write failure. Fatal for the connection.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A handshake response or outbound message could not be encoded or
    /// decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<reqwest::Error> for RtmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
