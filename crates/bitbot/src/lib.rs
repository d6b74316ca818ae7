//! # Bitbot
//!
//! Toolkit for Slack bots on the real-time messaging (RTM) API.
//!
//! A bot registers handlers on an [`EventRouter`](bitbot_rtm::EventRouter)
//! keyed by event `type`, then hands it to [`run_session`], which checks the
//! token with `auth.test`, performs the `rtm.start` handshake, and dispatches
//! every inbound event until the connection fails.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bitbot::prelude::*;
//!
//! # async fn start() -> Result<(), BitbotError> {
//! let config = BotConfig::from_env()?;
//!
//! let router = EventRouter::new();
//! router.handle_typed("message", |w: &dyn ResponseWriter, msg: MessageEvent| {
//!     if msg.text.as_deref() == Some("!ping") {
//!         if let Some(channel) = msg.channel.as_deref() {
//!             let _ = w.write_message(channel, "pong");
//!         }
//!     }
//! });
//!
//! Err(bitbot::run(config, &router).await)
//! # }
//! ```

mod config;
mod error;
mod session;

pub use config::{BotConfig, API_URL_VAR, ORIGIN_VAR, TOKEN_VAR};
pub use error::BitbotError;
pub use session::{run, run_session};

/// Version of this crate, logged by the binary at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-exports of the sub-crates, for reaching items the prelude omits.
pub use bitbot_auth as auth;
pub use bitbot_protocol as protocol;
pub use bitbot_rtm as rtm;
pub use bitbot_transport as transport;

/// Common imports for writing a bot.
pub mod prelude {
    pub use crate::{run, run_session, BitbotError, BotConfig, VERSION};
    pub use bitbot_auth::{SlackTokenVerifier, TokenVerifier};
    pub use bitbot_protocol::{Event, Hello, MessageEvent, OutboundMessage, Pong};
    pub use bitbot_rtm::{
        Dispatch, EventRouter, Handler, OutboundWriter, ResponseWriter, RtmClient, RtmConfig,
        RtmConnection, RtmError,
    };
}
