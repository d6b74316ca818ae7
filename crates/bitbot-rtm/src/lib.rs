//! Real-time messaging (RTM) client for Bitbot.
//!
//! This crate is the event-routing and streaming-connection core:
//!
//! - [`EventRouter`] maps an event's `type` to a [`Handler`].
//! - [`RtmClient`] performs the `rtm.start` handshake and dials the socket.
//! - [`RtmConnection::listen`] runs the read loop: reassemble frames,
//!   decode, reset the keepalive [`Watchdog`], dispatch.
//! - [`OutboundWriter`] is the [`ResponseWriter`] handlers reply through;
//!   it stamps every outbound message with a per-connection `id`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bitbot_rtm::{EventRouter, RtmClient, RtmConfig};
//!
//! # async fn run() {
//! let router = Arc::new(EventRouter::new());
//! router.handle_fn("hello", |w, _event| {
//!     let _ = w.write_message("C123", "ready");
//! });
//!
//! let err = RtmClient::new(RtmConfig::default())
//!     .dial_and_listen("xoxb-token", &router)
//!     .await;
//! eprintln!("RTM session ended: {err}");
//! # }
//! ```

mod client;
mod config;
mod error;
mod handler;
mod router;
mod watchdog;
mod writer;

pub use client::{RtmClient, RtmConnection};
pub use config::{RtmConfig, DEFAULT_API_BASE_URL, EMPTY_READ_BACKOFF, READ_BUFFER_SIZE};
pub use error::RtmError;
pub use handler::{handler_fn, typed_handler, Handler, HandlerFn, ResponseWriter, TypedHandler};
pub use router::{Dispatch, EventRouter};
pub use watchdog::{Watchdog, KEEPALIVE_INTERVAL};
pub use writer::OutboundWriter;
