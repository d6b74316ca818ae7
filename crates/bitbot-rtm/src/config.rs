//! Connection settings.

use std::time::Duration;

use crate::watchdog::KEEPALIVE_INTERVAL;

/// Base URL of the Slack Web API, which serves `rtm.start`.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Default size of the socket read buffer. Frames larger than this are
/// read in several chunks and reassembled.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Pause after a read that returned no data, so an idle-but-open socket
/// does not spin the read loop.
pub const EMPTY_READ_BACKOFF: Duration = Duration::from_secs(1);

/// Settings for an RTM connection.
///
/// Every field has a sensible default; override only what you need:
///
/// ```rust
/// use std::time::Duration;
/// use bitbot_rtm::RtmConfig;
///
/// let config = RtmConfig::default()
///     .with_origin("https://bot.example")
///     .with_keepalive_interval(Duration::from_secs(10));
/// assert_eq!(config.read_buffer_size, 4096);
/// ```
#[derive(Debug, Clone)]
pub struct RtmConfig {
    /// Web API base URL; `rtm.start` is requested relative to it.
    pub api_base_url: String,
    /// Value for the socket handshake's `Origin` header, if any.
    pub origin: Option<String>,
    /// Idle time before the watchdog sends a `ping`.
    pub keepalive_interval: Duration,
    /// Capacity of each socket read.
    pub read_buffer_size: usize,
    /// Sleep after an empty read with nothing buffered.
    pub empty_read_backoff: Duration,
}

impl Default for RtmConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            origin: None,
            keepalive_interval: KEEPALIVE_INTERVAL,
            read_buffer_size: READ_BUFFER_SIZE,
            empty_read_backoff: EMPTY_READ_BACKOFF,
        }
    }
}

impl RtmConfig {
    /// Sets the Web API base URL. Trailing slashes are trimmed.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the `Origin` header sent when dialing the socket. An empty
    /// string means no header.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        self.origin = (!origin.is_empty()).then_some(origin);
        self
    }

    /// Sets the idle time before the watchdog sends a `ping`.
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sets the read buffer capacity (minimum 1 byte).
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Sets the pause after an empty read with nothing buffered.
    pub fn with_empty_read_backoff(mut self, backoff: Duration) -> Self {
        self.empty_read_backoff = backoff;
        self
    }

    pub(crate) fn start_endpoint(&self) -> String {
        format!("{}/rtm.start", self.api_base_url)
    }
}
