//! Read-loop, dispatch, and write-path tests for `RtmConnection`.
//!
//! The connection runs over a scripted in-memory socket: each read returns
//! the next scripted step, and every sent frame is forwarded to a channel
//! the test reads from. Timer-dependent tests use `start_paused = true` so
//! the 25s keepalive and 1s empty-read backoff resolve instantly.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bitbot_protocol::{Event, OutboundMessage};
use bitbot_rtm::{EventRouter, ResponseWriter, RtmConfig, RtmConnection, RtmError};
use bitbot_transport::{Connection, ConnectionId, TransportError};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

// =========================================================================
// Scripted socket
// =========================================================================

enum Step {
    /// Return these bytes from one read.
    Chunk(Vec<u8>),
    /// Return `Ok(0)`.
    Empty,
    /// Return a read error.
    Fail,
    /// Wait, then return these bytes from one read.
    After(Duration, Vec<u8>),
}

struct ScriptedSocket {
    steps: Mutex<VecDeque<Step>>,
    sent: mpsc::UnboundedSender<Vec<u8>>,
    fail_sends: bool,
}

impl Connection for ScriptedSocket {
    async fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Chunk(bytes)) => {
                assert!(bytes.len() <= buf.len(), "scripted chunk larger than read buffer");
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Step::Empty) => Ok(0),
            Some(Step::Fail) => Err(TransportError::ConnectionClosed("scripted failure".into())),
            Some(Step::After(delay, bytes)) => {
                time::sleep(delay).await;
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            // Script exhausted: behave like an idle socket.
            None => std::future::pending().await,
        }
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted send failure",
            )));
        }
        let _ = self.sent.send(data.to_vec());
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        ConnectionId::new(99)
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn frame(value: Value) -> Step {
    Step::Chunk(serde_json::to_vec(&value).unwrap())
}

fn scripted(steps: Vec<Step>) -> (ScriptedSocket, mpsc::UnboundedReceiver<Vec<u8>>) {
    scripted_with(steps, false)
}

fn scripted_with(
    steps: Vec<Step>,
    fail_sends: bool,
) -> (ScriptedSocket, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (sent, rx) = mpsc::unbounded_channel();
    let socket = ScriptedSocket {
        steps: Mutex::new(steps.into()),
        sent,
        fail_sends,
    };
    (socket, rx)
}

/// Registers a handler for `kind` that forwards each event to a channel.
fn record(router: &EventRouter, kind: &str) -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    router.handle_fn(kind, move |_, event| {
        let _ = tx.send(event.clone());
    });
    rx
}

/// Spawns `listen` and returns its handle.
fn spawn_listen(
    socket: ScriptedSocket,
    config: RtmConfig,
    router: Arc<EventRouter>,
) -> tokio::task::JoinHandle<RtmError> {
    let conn = RtmConnection::new(socket, config);
    tokio::spawn(async move { conn.listen(&router).await })
}

async fn next_sent(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Value {
    let bytes = time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for outbound frame")
        .expect("socket dropped");
    serde_json::from_slice(&bytes).unwrap()
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("handler dropped")
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_hello_handler_reply_is_stamped_with_first_id() {
    let router = Arc::new(EventRouter::new());
    router.handle_fn("hello", |w, _| {
        w.write_message("C123", "ready").unwrap();
    });
    let (socket, mut sent) = scripted(vec![frame(json!({"type": "hello"}))]);

    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    let out = next_sent(&mut sent).await;
    assert_eq!(
        out,
        json!({"type": "message", "channel": "C123", "text": "ready", "id": 0})
    );

    // Exactly one write.
    tokio::task::yield_now().await;
    assert!(sent.try_recv().is_err());
    task.abort();
}

#[tokio::test]
async fn test_frame_split_across_reads_is_reassembled() {
    let prefix = r#"{"type":"big","pad":""#;
    let pad = "x".repeat(5000 - prefix.len() - 2);
    let raw = format!("{prefix}{pad}\"}}");
    assert_eq!(raw.len(), 5000);
    let bytes = raw.into_bytes();

    let router = Arc::new(EventRouter::new());
    let mut events = record(&router, "big");
    let (socket, _sent) = scripted(vec![
        Step::Chunk(bytes[..4096].to_vec()),
        Step::Chunk(bytes[4096..].to_vec()),
    ]);

    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    let event = next_event(&mut events).await;
    assert_eq!(event.get("pad").and_then(Value::as_str).map(str::len), Some(pad.len()));

    tokio::task::yield_now().await;
    assert!(events.try_recv().is_err(), "one frame must yield one event");
    task.abort();
}

#[tokio::test]
async fn test_frame_ending_on_buffer_boundary_is_closed_by_empty_read() {
    let raw = br#"{"type":"edge"}"#.to_vec();
    let config = RtmConfig::default().with_read_buffer_size(raw.len());

    let router = Arc::new(EventRouter::new());
    let mut events = record(&router, "edge");
    let (socket, _sent) = scripted(vec![
        Step::Chunk(raw.clone()),
        Step::Empty,
        Step::Chunk(raw),
        Step::Empty,
    ]);

    let task = spawn_listen(socket, config, Arc::clone(&router));

    next_event(&mut events).await;
    next_event(&mut events).await;
    task.abort();
}

#[tokio::test]
async fn test_malformed_frame_does_not_stop_loop() {
    let router = Arc::new(EventRouter::new());
    let mut hellos = record(&router, "hello");
    let (socket, _sent) = scripted(vec![
        Step::Chunk(b"{\"type\": \"hel".to_vec()),
        frame(json!({"ok": true, "reply_to": 1})),
        frame(json!(["not", "an", "object"])),
        frame(json!({"type": "hello"})),
    ]);

    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    let event = next_event(&mut hellos).await;
    assert_eq!(event.kind(), "hello");
    task.abort();
}

#[tokio::test]
async fn test_panicking_handler_does_not_stop_loop() {
    let router = Arc::new(EventRouter::new());
    router.handle_fn("boom", |_, _| panic!("handler failure"));
    let mut hellos = record(&router, "hello");
    let (socket, _sent) = scripted(vec![
        frame(json!({"type": "boom"})),
        frame(json!({"type": "hello"})),
    ]);

    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    next_event(&mut hellos).await;
    assert!(!task.is_finished());
    task.abort();
}

#[tokio::test]
async fn test_events_dispatched_in_arrival_order() {
    let router = Arc::new(EventRouter::new());
    let mut events = record(&router, "message");
    let (socket, _sent) = scripted(
        (0..5)
            .map(|i| frame(json!({"type": "message", "text": i.to_string()})))
            .collect(),
    );

    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    for i in 0..5 {
        let event = next_event(&mut events).await;
        assert_eq!(event.get("text"), Some(&json!(i.to_string())));
    }
    task.abort();
}

#[tokio::test]
async fn test_read_error_ends_listen() {
    let router = Arc::new(EventRouter::new());
    let mut hellos = record(&router, "hello");
    let (socket, _sent) = scripted(vec![frame(json!({"type": "hello"})), Step::Fail]);

    let err = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router))
        .await
        .unwrap();

    assert!(matches!(
        err,
        RtmError::Transport(TransportError::ConnectionClosed(_))
    ));
    assert_eq!(next_event(&mut hellos).await.kind(), "hello");
}

#[tokio::test]
async fn test_send_error_ends_listen() {
    let router = Arc::new(EventRouter::new());
    router.handle_fn("hello", |w, _| {
        let _ = w.write_message("C1", "hi");
    });
    let (socket, _sent) = scripted_with(vec![frame(json!({"type": "hello"}))], true);

    let err = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router))
        .await
        .unwrap();

    assert!(matches!(err, RtmError::Transport(TransportError::SendFailed(_))));
}

#[tokio::test]
async fn test_writes_before_listen_are_sent_first() {
    let router = Arc::new(EventRouter::new());
    let (socket, mut sent) = scripted(vec![]);
    let conn = RtmConnection::new(socket, RtmConfig::default());

    let writer = conn.writer();
    writer.write(OutboundMessage::new("presence_sub")).unwrap();
    assert_eq!(writer.next_id(), 1);

    let task = tokio::spawn({
        let router = Arc::clone(&router);
        async move { conn.listen(&router).await }
    });

    let out = next_sent(&mut sent).await;
    assert_eq!(out, json!({"type": "presence_sub", "id": 0}));
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_empty_read_backs_off_before_retry() {
    let router = Arc::new(EventRouter::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    router.handle_fn("hello", move |_, _| {
        let _ = tx.send(Instant::now());
    });
    let (socket, _sent) = scripted(vec![Step::Empty, frame(json!({"type": "hello"}))]);

    let start = Instant::now();
    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    let dispatched_at = time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(dispatched_at - start >= Duration::from_secs(1));
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_idle_connection_sends_ping_after_keepalive_interval() {
    let router = Arc::new(EventRouter::new());
    router.handle_fn("hello", |w, _| {
        w.write_message("C123", "ready").unwrap();
    });
    let (socket, mut sent) = scripted(vec![frame(json!({"type": "hello"}))]);

    let start = Instant::now();
    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    let reply = next_sent(&mut sent).await;
    assert_eq!(reply["id"], json!(0));

    let ping = next_sent(&mut sent).await;
    assert_eq!(ping, json!({"type": "ping", "id": 1}));
    assert!(start.elapsed() >= Duration::from_secs(25));
    assert!(start.elapsed() < Duration::from_secs(50));

    // Still idle: exactly one more ping per interval.
    let ping = next_sent(&mut sent).await;
    assert_eq!(ping, json!({"type": "ping", "id": 2}));
    assert!(start.elapsed() >= Duration::from_secs(50));
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_inbound_frame_postpones_keepalive_ping() {
    let router = Arc::new(EventRouter::new());
    let (socket, mut sent) = scripted(vec![
        frame(json!({"type": "hello"})),
        Step::After(
            Duration::from_secs(20),
            serde_json::to_vec(&json!({"type": "presence_change"})).unwrap(),
        ),
    ]);

    let start = Instant::now();
    let task = spawn_listen(socket, RtmConfig::default(), Arc::clone(&router));

    // Without the reset at 20s the ping would go out at 25s.
    let ping = next_sent(&mut sent).await;
    assert_eq!(ping, json!({"type": "ping", "id": 0}));
    assert!(start.elapsed() >= Duration::from_secs(45));
    assert!(start.elapsed() < Duration::from_secs(46));
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_handler_and_keepalive_ids_interleave_without_gaps() {
    let router = Arc::new(EventRouter::new());
    let (socket, mut sent) = scripted(vec![frame(json!({"type": "hello"}))]);
    let conn = RtmConnection::new(socket, RtmConfig::default());
    let writer = conn.writer();

    let task = tokio::spawn({
        let router = Arc::clone(&router);
        async move { conn.listen(&router).await }
    });

    // A background task writes every 10s while the watchdog pings every
    // 25s of inbound silence.
    let background = tokio::spawn(async move {
        for i in 0..6 {
            time::sleep(Duration::from_secs(10)).await;
            writer.write_message("C1", &format!("tick {i}")).unwrap();
        }
    });

    let mut ids = Vec::new();
    let mut pings = 0;
    while ids.len() < 8 {
        let frame = next_sent(&mut sent).await;
        if frame["type"] == "ping" {
            pings += 1;
        }
        ids.push(frame["id"].as_u64().unwrap());
    }

    assert_eq!(ids, (0..8).collect::<Vec<u64>>());
    assert!(pings >= 1);
    background.await.unwrap();
    task.abort();
}
