//! Keepalive watchdog.
//!
//! The service drops RTM sockets that stay silent for too long. The
//! watchdog runs on its own task and sends a `ping` whenever a full
//! interval passes without [`Watchdog::reset`] being called. After a ping
//! it re-arms, so a connection that stays idle pings once per interval.
//!
//! ```text
//!  frame   frame                    ping           ping
//!    │       │                       │              │
//! ───┴───────┴───────────────────────┴──────────────┴──▶ time
//!            └────── interval ───────┘── interval ──┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use bitbot_protocol::OutboundMessage;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};

use crate::handler::ResponseWriter;

/// Default idle interval before a keepalive ping.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(25);

/// Handle to a running keepalive task. Dropping it stops the task.
pub struct Watchdog {
    reset: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Watchdog {
    /// Starts the watchdog. The first ping is due `interval` from now.
    pub fn arm<W>(interval: Duration, writer: W) -> Self
    where
        W: ResponseWriter + 'static,
    {
        let reset = Arc::new(Notify::new());
        let task = tokio::spawn(run(interval, writer, Arc::clone(&reset)));
        debug!(interval_ms = interval.as_millis() as u64, "keepalive watchdog armed");
        Self { reset, task }
    }

    /// Restarts the idle interval. Called for every inbound frame.
    pub fn reset(&self) {
        self.reset.notify_one();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<W: ResponseWriter>(interval: Duration, writer: W, reset: Arc<Notify>) {
    loop {
        tokio::select! {
            _ = time::sleep(interval) => {
                debug!("no inbound frame within keepalive interval, sending ping");
                if let Err(e) = writer.write(OutboundMessage::ping()) {
                    warn!(error = %e, "keepalive ping failed, stopping watchdog");
                    return;
                }
            }
            _ = reset.notified() => {}
        }
    }
}
