//! Bitbot command-line bot.
//!
//! Reads `BITBOT_TOKEN` (and optionally `BITBOT_ORIGIN`, `BITBOT_API_URL`)
//! from the environment or a `.env` file, connects, and answers `!ping`
//! with `pong`. Exits non-zero when the session ends.

use std::process::ExitCode;

use bitbot::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(version = VERSION, "starting bitbot");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "cannot start bot");
            return ExitCode::FAILURE;
        }
    };

    let router = EventRouter::new();
    router.handle_typed("hello", |_: &dyn ResponseWriter, _: Hello| {
        tracing::info!("connected to RTM");
    });
    router.handle_typed("message", |w: &dyn ResponseWriter, msg: MessageEvent| {
        if msg.subtype.is_some() || msg.text.as_deref().map(str::trim) != Some("!ping") {
            return;
        }
        let Some(channel) = msg.channel.as_deref() else {
            return;
        };
        if let Err(e) = w.write_message(channel, "pong") {
            tracing::warn!(%channel, error = %e, "failed to answer ping");
        }
    });

    let err = bitbot::run(config, &router).await;
    tracing::error!(error = %err, "bot session ended");
    ExitCode::FAILURE
}
