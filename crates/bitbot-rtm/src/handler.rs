//! The handler contract: what the router calls and what handlers may call
//! back into.
//!
//! A [`Handler`] receives one [`Event`] at a time together with a
//! [`ResponseWriter`] it can use to reply on the same connection. Handlers
//! run synchronously on the read loop, so a slow handler delays the next
//! event; long work should be handed off to a spawned task holding an
//! [`OutboundWriter`](crate::OutboundWriter).

use std::marker::PhantomData;
use std::sync::Arc;

use bitbot_protocol::{Event, OutboundMessage};
use serde::de::DeserializeOwned;

use crate::RtmError;

/// Capability, exposed to handlers, to send frames back over the
/// originating connection.
pub trait ResponseWriter: Send + Sync {
    /// Sends `message`. The connection injects the `id` field.
    ///
    /// Returns the number of bytes queued for the socket.
    fn write(&self, message: OutboundMessage) -> Result<usize, RtmError>;

    /// Sends a plain text message to `channel`.
    fn write_message(&self, channel: &str, text: &str) -> Result<usize, RtmError> {
        self.write(OutboundMessage::message(channel, text))
    }
}

/// Receives events for the patterns it is registered under.
///
/// If `handle_event` panics, the panic is caught at the dispatch boundary,
/// logged, and the connection moves on to the next event.
///
/// # Example
///
/// ```rust
/// use bitbot_protocol::Event;
/// use bitbot_rtm::{Handler, ResponseWriter};
///
/// /// Answers every greeting in a fixed channel.
/// struct Greeter {
///     channel: String,
/// }
///
/// impl Handler for Greeter {
///     fn handle_event(&self, writer: &dyn ResponseWriter, _event: &Event) {
///         let _ = writer.write_message(&self.channel, "ready");
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one event. May write zero or more replies.
    fn handle_event(&self, writer: &dyn ResponseWriter, event: &Event);
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle_event(&self, writer: &dyn ResponseWriter, event: &Event) {
        (**self).handle_event(writer, event)
    }
}

/// Adapter that lets a plain closure act as a [`Handler`].
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&dyn ResponseWriter, &Event) + Send + Sync + 'static,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&dyn ResponseWriter, &Event) + Send + Sync + 'static,
{
    fn handle_event(&self, writer: &dyn ResponseWriter, event: &Event) {
        (self.f)(writer, event)
    }
}

/// Adapter that decodes the event payload into `T` before calling the
/// closure.
///
/// This is the second half of tag-first decoding: the router picked this
/// handler from the `type` tag, and the handler now decodes the full
/// payload against the shape registered for that tag. A payload that does
/// not fit `T` is logged and dropped.
pub struct TypedHandler<T, F> {
    f: F,
    _payload: PhantomData<fn() -> T>,
}

/// Wraps a closure taking a decoded payload as a [`Handler`].
pub fn typed_handler<T, F>(f: F) -> TypedHandler<T, F>
where
    T: DeserializeOwned + 'static,
    F: Fn(&dyn ResponseWriter, T) + Send + Sync + 'static,
{
    TypedHandler {
        f,
        _payload: PhantomData,
    }
}

impl<T, F> Handler for TypedHandler<T, F>
where
    T: DeserializeOwned + 'static,
    F: Fn(&dyn ResponseWriter, T) + Send + Sync + 'static,
{
    fn handle_event(&self, writer: &dyn ResponseWriter, event: &Event) {
        match event.decode::<T>() {
            Ok(payload) => (self.f)(writer, payload),
            Err(e) => {
                tracing::warn!(
                    kind = event.kind(),
                    error = %e,
                    "event payload does not match handler type, dropping"
                );
            }
        }
    }
}
