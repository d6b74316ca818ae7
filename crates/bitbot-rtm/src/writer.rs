//! Outbound write path: id stamping and the queue feeding the socket.

use std::sync::Arc;

use bitbot_protocol::{Codec, JsonCodec, OutboundMessage};
use bitbot_transport::TransportError;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::handler::ResponseWriter;
use crate::RtmError;

struct OutboundState {
    next_id: u64,
    queue: mpsc::UnboundedSender<Vec<u8>>,
}

/// Cloneable [`ResponseWriter`] for one RTM connection.
///
/// Every write takes the same lock to stamp the `id`, serialize, and queue
/// the frame, so ids are unique and strictly increasing per connection and
/// the socket sees frames in id order, whether the write came from a
/// handler, the keepalive task, or any other task holding a clone.
///
/// The queue is unbounded so that `write` never blocks or fails while the
/// socket is merely slow: handlers run synchronously inside the read loop,
/// and rejecting a write there would drop a reply the caller already
/// stamped. A stalled socket therefore grows the queue until the send
/// fails and `listen` returns, which drops the queue with the connection.
#[derive(Clone)]
pub struct OutboundWriter {
    state: Arc<Mutex<OutboundState>>,
}

impl OutboundWriter {
    /// Creates a writer whose first message gets `initial_id`, and the
    /// receiving end of its frame queue.
    pub(crate) fn new(initial_id: u64) -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (queue, rx) = mpsc::unbounded_channel();
        let state = OutboundState {
            next_id: initial_id,
            queue,
        };
        (
            Self {
                state: Arc::new(Mutex::new(state)),
            },
            rx,
        )
    }

    /// The id the next successful write will carry.
    pub fn next_id(&self) -> u64 {
        self.state.lock().next_id
    }
}

impl ResponseWriter for OutboundWriter {
    fn write(&self, message: OutboundMessage) -> Result<usize, RtmError> {
        let mut state = self.state.lock();
        let id = state.next_id;
        let frame = JsonCodec.encode(&message.to_wire(id))?;
        let len = frame.len();

        state
            .queue
            .send(frame)
            .map_err(|_| TransportError::ConnectionClosed("outbound queue closed".into()))?;
        state.next_id += 1;

        tracing::trace!(id, kind = message.kind(), bytes = len, "queued outbound message");
        Ok(len)
    }
}
