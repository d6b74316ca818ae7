//! Error types for the protocol layer.
//!
//! Each Bitbot crate defines its own error enum. A `ProtocolError` always
//! means a problem turning bytes into events or messages into bytes, never
//! a networking or routing problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, or a payload that does not
    /// match the requested type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded, but it is not an object with a string `type`
    /// field, so it cannot be routed.
    #[error("event has no string `type` field")]
    MissingType,

    /// The message is well-formed JSON but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
