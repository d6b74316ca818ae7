//! Wire protocol for Bitbot.
//!
//! This crate defines what travels over the RTM socket and the HTTP
//! endpoints around it:
//!
//! - **Events** ([`Event`]): inbound frames, decoded tag-first: the `type`
//!   field is extracted up front and the rest of the payload stays untyped
//!   until a handler asks for a concrete shape with [`Event::decode`].
//! - **Outbound messages** ([`OutboundMessage`]): replies written by
//!   handlers; the connection stamps each one with an `id` before sending.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes ↔ values.
//! - **Types**: `rtm.start` / `auth.test` responses, typed event payloads,
//!   and the passive Slack records (channels, teams, users).
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Event) → RTM router (handlers)
//! ```

mod codec;
mod error;
mod event;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use event::{Event, OutboundMessage};
pub use types::{
    AuthTestResponse, Channel, Hello, MessageEvent, Pong, Preferences, Property, SelfInfo,
    StartResponse, Team,
};
