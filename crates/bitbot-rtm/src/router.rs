//! The event router (mux): maps an event's `type` to one handler.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bitbot_protocol::Event;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::handler::{handler_fn, typed_handler, Handler, ResponseWriter};

/// A registered handler with the pattern it was registered under.
#[derive(Clone)]
struct Route {
    pattern: String,
    handler: Arc<dyn Handler>,
}

/// Outcome of [`EventRouter::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler was found and returned normally.
    Handled { pattern: String },
    /// No handler is registered for the event's type. Not an error.
    Unrouted,
    /// The handler panicked. The panic was contained to this dispatch.
    Faulted { pattern: String, message: String },
}

/// Routes RTM events to handlers by exact match on the event's `type`.
///
/// Registration and lookup share one read-write lock, so a `register`
/// racing a `dispatch` never observes a torn table. The lock is released
/// before a handler runs: a handler may register or remove patterns on the
/// router that is dispatching it.
///
/// Patterns are matched exactly. Registering a pattern that already exists
/// replaces the previous handler.
///
/// ```rust
/// use bitbot_rtm::{Dispatch, EventRouter, ResponseWriter, RtmError};
/// use bitbot_protocol::{Event, OutboundMessage};
///
/// struct Discard;
/// impl ResponseWriter for Discard {
///     fn write(&self, _: OutboundMessage) -> Result<usize, RtmError> { Ok(0) }
/// }
///
/// let router = EventRouter::new();
/// router.handle_fn("hello", |w, _event| {
///     let _ = w.write_message("C123", "ready");
/// });
///
/// let hello = Event::from_slice(br#"{"type":"hello"}"#).unwrap();
/// assert_eq!(
///     router.dispatch(&Discard, &hello),
///     Dispatch::Handled { pattern: "hello".into() }
/// );
/// ```
#[derive(Default)]
pub struct EventRouter {
    routes: RwLock<HashMap<String, Route>>,
}

impl EventRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events whose `type` equals `pattern`,
    /// replacing any earlier registration for the same pattern.
    pub fn register(&self, pattern: impl Into<String>, handler: impl Handler) {
        self.register_shared(pattern, Arc::new(handler));
    }

    /// Registers an already shared handler.
    pub fn register_shared(&self, pattern: impl Into<String>, handler: Arc<dyn Handler>) {
        let pattern = pattern.into();
        if pattern.is_empty() {
            tracing::warn!("registering handler for empty pattern");
        }
        let route = Route {
            pattern: pattern.clone(),
            handler,
        };
        let replaced = self.routes.write().insert(pattern.clone(), route).is_some();
        tracing::debug!(%pattern, replaced, "handler registered");
    }

    /// Registers a closure for `pattern`.
    pub fn handle_fn<F>(&self, pattern: impl Into<String>, f: F)
    where
        F: Fn(&dyn ResponseWriter, &Event) + Send + Sync + 'static,
    {
        self.register(pattern, handler_fn(f));
    }

    /// Registers a closure that receives the payload decoded as `T`.
    pub fn handle_typed<T, F>(&self, pattern: impl Into<String>, f: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(&dyn ResponseWriter, T) + Send + Sync + 'static,
    {
        self.register(pattern, typed_handler(f));
    }

    /// Removes the handler for `pattern`. Returns whether one was present.
    pub fn deregister(&self, pattern: &str) -> bool {
        self.routes.write().remove(pattern).is_some()
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns `true` if no patterns are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Registered patterns, sorted.
    pub fn patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self.routes.read().keys().cloned().collect();
        patterns.sort();
        patterns
    }

    /// Finds the handler for `event` and the pattern it matched.
    ///
    /// Returns `None` when nothing is registered for the event's type.
    pub fn resolve(&self, event: &Event) -> Option<(Arc<dyn Handler>, String)> {
        let routes = self.routes.read();
        routes
            .get(event.kind())
            .map(|route| (Arc::clone(&route.handler), route.pattern.clone()))
    }

    /// Resolves `event` and runs its handler inside a panic boundary.
    ///
    /// Unrouted events are dropped silently. A panicking handler is logged
    /// and reported as [`Dispatch::Faulted`]; it never unwinds into the
    /// caller.
    pub fn dispatch(&self, writer: &dyn ResponseWriter, event: &Event) -> Dispatch {
        let Some((handler, pattern)) = self.resolve(event) else {
            tracing::trace!(kind = event.kind(), "no handler registered");
            return Dispatch::Unrouted;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle_event(writer, event))) {
            Ok(()) => Dispatch::Handled { pattern },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(%pattern, panic = %message, "handler panicked");
                Dispatch::Faulted { pattern, message }
            }
        }
    }
}

/// A router is itself a handler, so routers can be nested.
impl Handler for EventRouter {
    fn handle_event(&self, writer: &dyn ResponseWriter, event: &Event) {
        self.dispatch(writer, event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
