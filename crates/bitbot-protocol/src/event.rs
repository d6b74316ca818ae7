//! Inbound events and outbound messages.
//!
//! Both directions are JSON objects carrying a string `type` field. Inbound
//! [`Event`]s are routed on that field; outbound [`OutboundMessage`]s get an
//! `id` stamped on by the connection right before they hit the socket.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A decoded inbound RTM event.
///
/// Decoding is tag-first: the `type` discriminant is pulled out and checked
/// when the event is built, so every `Event` that exists has a routable
/// [`kind`](Self::kind). The remaining fields stay untyped until a handler
/// asks for a concrete payload with [`decode`](Self::decode).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: String,
    payload: Map<String, Value>,
}

impl Event {
    /// Builds an event from an already-parsed JSON value.
    ///
    /// # Errors
    /// `ProtocolError::MissingType` if `value` is not an object or has no
    /// string `type` field.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(payload) = value else {
            return Err(ProtocolError::MissingType);
        };
        let kind = match payload.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => return Err(ProtocolError::MissingType),
        };
        Ok(Self { kind, payload })
    }

    /// Parses a raw frame into an event.
    ///
    /// Malformed JSON is `ProtocolError::Decode`; valid JSON without a
    /// routable tag is `ProtocolError::MissingType`.
    pub fn from_slice(data: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(data).map_err(ProtocolError::Decode)?;
        Self::from_value(value)
    }

    /// The event's `type` tag, used as the routing key.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns a single field of the payload.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    /// The full payload, `type` included.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Decodes the full payload into a typed variant.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(Value::Object(self.payload.clone())).map_err(ProtocolError::Decode)
    }

    /// Consumes the event and returns the payload as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.payload)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Event::from_value(value).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// OutboundMessage
// ---------------------------------------------------------------------------

/// A message to send over the RTM socket.
///
/// The `type` is fixed at construction. Any `id` field set by the caller is
/// replaced when the message is stamped with [`to_wire`](Self::to_wire).
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    kind: String,
    fields: Map<String, Value>,
}

impl OutboundMessage {
    /// Creates a message of the given type with no other fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Adds (or replaces) a field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// A plain text message: `{type: "message", channel, text}`.
    pub fn message(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("message")
            .with("channel", channel.into())
            .with("text", text.into())
    }

    /// A keepalive ping: `{type: "ping"}`.
    pub fn ping() -> Self {
        Self::new("ping")
    }

    /// The message's `type`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns a field previously set with [`with`](Self::with).
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Builds the JSON object that goes on the wire, with `id` injected.
    pub fn to_wire(&self, id: u64) -> Map<String, Value> {
        let mut wire = self.fields.clone();
        wire.insert("type".into(), Value::String(self.kind.clone()));
        wire.insert("id".into(), Value::from(id));
        wire
    }
}

impl TryFrom<Map<String, Value>> for OutboundMessage {
    type Error = ProtocolError;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.remove("type") {
            Some(Value::String(kind)) => Ok(Self { kind, fields }),
            _ => Err(ProtocolError::InvalidMessage(
                "outbound message requires a string `type`".into(),
            )),
        }
    }
}

impl TryFrom<Value> for OutboundMessage {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            _ => Err(ProtocolError::InvalidMessage(
                "outbound message must be a JSON object".into(),
            )),
        }
    }
}
