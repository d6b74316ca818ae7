//! RTM session lifecycle: handshake, dial, and the read loop.
//!
//! ```text
//!  RtmClient ──dial()──▶ RtmConnection ──listen()──▶ RtmError
//!   (idle)    rtm.start    (connected)    read loop    (closed)
//!             + socket                    + keepalive
//! ```
//!
//! Each step consumes the previous value, so a connection is dialed once
//! and cannot be listened on again after it fails. To reconnect, build a
//! new [`RtmClient`]. Nothing here retries.

use std::time::Duration;

use bitbot_protocol::{Codec, Event, JsonCodec, StartResponse};
use bitbot_transport::{Connection, ConnectionId, TransportError, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::router::EventRouter;
use crate::watchdog::Watchdog;
use crate::writer::OutboundWriter;
use crate::{RtmConfig, RtmError};

/// Id carried by the first outbound message on a connection.
const INITIAL_SEND_ID: u64 = 0;

/// Starts RTM sessions.
pub struct RtmClient {
    http: reqwest::Client,
    config: RtmConfig,
}

impl RtmClient {
    /// Creates a client with the given settings.
    pub fn new(config: RtmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Replaces the HTTP client used for `rtm.start`.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Returns the settings this client dials with.
    pub fn config(&self) -> &RtmConfig {
        &self.config
    }

    /// Calls `rtm.start` and returns the one-time socket URL.
    ///
    /// # Errors
    /// `RtmError::HandshakeRejected` when the service answers `ok: false`.
    pub async fn start(&self, token: &str) -> Result<String, RtmError> {
        debug!("requesting rtm.start");
        let body = self
            .http
            .get(self.config.start_endpoint())
            .query(&[("token", token)])
            .send()
            .await?
            .bytes()
            .await?;
        debug!(bytes = body.len(), "rtm.start responded");

        let response: StartResponse = JsonCodec.decode(&body)?;
        if !response.ok {
            let reason = response.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(RtmError::HandshakeRejected(reason));
        }
        response.url.filter(|url| !url.is_empty()).ok_or_else(|| {
            bitbot_protocol::ProtocolError::InvalidMessage("rtm.start response has no url".into())
                .into()
        })
    }

    /// Performs the handshake and opens the socket.
    ///
    /// The socket URL expires shortly after it is issued, so the dial
    /// follows `rtm.start` immediately.
    pub async fn dial(self, token: &str) -> Result<RtmConnection<WebSocketConnection>, RtmError> {
        let url = self.start(token).await?;
        let origin = self.config.origin.as_deref();
        debug!(origin = origin.unwrap_or_default(), "dialing RTM socket");
        let socket = WebSocketConnection::dial(&url, origin).await?;
        info!(conn_id = %socket.id(), "RTM socket connected");
        Ok(RtmConnection::new(socket, self.config))
    }

    /// Dials and then listens until the connection fails.
    ///
    /// Only returns on error. To send messages from outside a handler,
    /// register a handler for `hello` and capture an
    /// [`OutboundWriter`] from there, or use [`dial`](Self::dial) and
    /// [`RtmConnection::writer`].
    pub async fn dial_and_listen(self, token: &str, router: &EventRouter) -> RtmError {
        match self.dial(token).await {
            Ok(conn) => conn.listen(router).await,
            Err(e) => e,
        }
    }
}

/// A connected RTM socket, ready to listen.
pub struct RtmConnection<C> {
    socket: C,
    config: RtmConfig,
    writer: OutboundWriter,
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl<C: Connection> RtmConnection<C> {
    /// Wraps an already open socket.
    pub fn new(socket: C, config: RtmConfig) -> Self {
        let (writer, outbound) = OutboundWriter::new(INITIAL_SEND_ID);
        Self {
            socket,
            config,
            writer,
            outbound,
        }
    }

    /// Returns the identifier of the underlying socket.
    pub fn id(&self) -> ConnectionId {
        self.socket.id()
    }

    /// A writer for this connection, usable from any task.
    ///
    /// Messages written before [`listen`](Self::listen) starts are queued
    /// and sent once it does.
    pub fn writer(&self) -> OutboundWriter {
        self.writer.clone()
    }

    /// Reads and dispatches events until the connection fails.
    ///
    /// Frames are dispatched one at a time, in arrival order, with this
    /// connection's writer as the [`ResponseWriter`](crate::ResponseWriter).
    /// Undecodable frames are logged and skipped; a panicking handler is
    /// contained by the router. A socket read or write error ends the loop
    /// and is returned.
    pub async fn listen(self, router: &EventRouter) -> RtmError {
        let Self {
            socket,
            config,
            writer,
            mut outbound,
        } = self;
        let conn_id = socket.id();

        let watchdog = Watchdog::arm(config.keepalive_interval, writer.clone());
        debug!(%conn_id, "ready to read events");

        let err = tokio::select! {
            err = read_loop(&socket, &config, router, &writer, &watchdog) => err,
            err = pump_outbound(&socket, &mut outbound) => err,
        };
        drop(watchdog);

        if let Err(e) = socket.close().await {
            trace!(%conn_id, error = %e, "close after failure also failed");
        }
        warn!(%conn_id, error = %err, "RTM connection closed");
        err
    }
}

async fn read_loop<C: Connection>(
    socket: &C,
    config: &RtmConfig,
    router: &EventRouter,
    writer: &OutboundWriter,
    watchdog: &Watchdog,
) -> RtmError {
    let conn_id = socket.id();
    let mut buf = vec![0u8; config.read_buffer_size.max(1)];

    loop {
        let frame = match read_frame(socket, &mut buf, config.empty_read_backoff).await {
            Ok(frame) => frame,
            Err(e) => return e.into(),
        };

        let event = match Event::from_slice(&frame) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    %conn_id,
                    error = %e,
                    frame = %String::from_utf8_lossy(&frame),
                    "dropping undecodable frame"
                );
                continue;
            }
        };

        watchdog.reset();
        trace!(%conn_id, kind = event.kind(), bytes = frame.len(), "dispatching event");
        router.dispatch(writer, &event);
    }
}

/// Reads one complete frame.
///
/// A read that fills `buf` means the frame may continue, so reading goes
/// on until a shorter read. An empty read with nothing buffered backs off
/// before retrying; an empty read after a full chunk ends the frame.
async fn read_frame<C: Connection>(
    socket: &C,
    buf: &mut [u8],
    backoff: Duration,
) -> Result<Vec<u8>, TransportError> {
    let mut frame = Vec::new();
    loop {
        let n = socket.read(buf).await?;
        if n == 0 {
            if !frame.is_empty() {
                return Ok(frame);
            }
            warn!(backoff_ms = backoff.as_millis() as u64, "empty read from socket, backing off");
            time::sleep(backoff).await;
            continue;
        }

        frame.extend_from_slice(&buf[..n]);
        if n < buf.len() {
            return Ok(frame);
        }
        trace!(read = n, buffered = frame.len(), "frame fills read buffer, draining");
    }
}

/// Moves queued frames onto the socket in order.
async fn pump_outbound<C: Connection>(
    socket: &C,
    outbound: &mut mpsc::UnboundedReceiver<Vec<u8>>,
) -> RtmError {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = socket.send(&frame).await {
            return e.into();
        }
    }
    TransportError::ConnectionClosed("outbound queue closed".into()).into()
}
