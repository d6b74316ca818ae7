//! WebSocket client transport using `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A client-side WebSocket connection.
///
/// The socket is split so that a pending read never blocks a send: the
/// read half and the write half sit behind separate locks.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<ChunkedReader>,
}

impl WebSocketConnection {
    /// Opens a WebSocket to `url`.
    ///
    /// `origin`, when present and non-empty, is sent as the `Origin` header
    /// of the opening handshake.
    pub async fn dial(url: &str, origin: Option<&str>) -> Result<Self, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        if let Some(origin) = origin.filter(|o| !o.is_empty()) {
            let value = HeaderValue::from_str(origin)
                .map_err(|e| TransportError::InvalidRequest(format!("origin header: {e}")))?;
            request.headers_mut().insert(ORIGIN, value);
        }

        let (ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, "dialed WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(Self {
            id,
            sink: Mutex::new(sink),
            reader: Mutex::new(ChunkedReader::new(stream)),
        })
    }
}

impl Connection for WebSocketConnection {
    async fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.reader.lock().await.read(buf).await
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let msg = Message::Text(String::from_utf8_lossy(data).into_owned().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Serves whole WebSocket messages to callers in buffer-sized chunks.
struct ChunkedReader {
    stream: SplitStream<WsStream>,
    frame: Vec<u8>,
    offset: usize,
    /// Set when the last chunk filled the caller's buffer and also finished
    /// the frame, so the next read must report the boundary with `Ok(0)`.
    boundary: bool,
}

impl ChunkedReader {
    fn new(stream: SplitStream<WsStream>) -> Self {
        Self {
            stream,
            frame: Vec::new(),
            offset: 0,
            boundary: false,
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.offset == self.frame.len() {
            if self.boundary {
                self.boundary = false;
                return Ok(0);
            }
            self.frame = self.next_frame().await?;
            self.offset = 0;
        }

        let remaining = &self.frame[self.offset..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        self.boundary = n > 0 && n == buf.len() && self.offset == self.frame.len();
        Ok(n)
    }

    async fn next_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_bytes().to_vec()),
                Some(Ok(Message::Binary(data))) => return Ok(data.to_vec()),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_string())
                        .unwrap_or_default();
                    return Err(TransportError::ConnectionClosed(reason));
                }
                None => {
                    return Err(TransportError::ConnectionClosed("stream ended".into()));
                }
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }
}
