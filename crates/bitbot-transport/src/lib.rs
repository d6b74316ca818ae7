//! Transport abstraction layer for Bitbot.
//!
//! Provides the [`Connection`] trait, a byte-level view of the persistent
//! socket the RTM client talks over, plus a WebSocket client implementation.
//!
//! Reads are chunked: [`Connection::read`] fills a caller-supplied buffer and
//! a single inbound frame may take several reads to drain. Callers detect
//! the end of a frame by a read that returns fewer bytes than the buffer
//! holds.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single open socket that can send frames and be read in chunks.
///
/// Reads and sends take `&self` so a reader and a writer can make progress
/// on the same connection at the same time.
pub trait Connection: Send + Sync + 'static {
    /// Reads the next chunk of inbound data into `buf`.
    ///
    /// Returns the number of bytes written into `buf`. A return value equal
    /// to `buf.len()` means the current frame may continue in the next read.
    /// `Ok(0)` is a transient empty read: either an empty frame arrived, or
    /// the previous chunk ended exactly on the frame boundary.
    fn read(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<usize, TransportError>> + Send;

    /// Sends one complete frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
