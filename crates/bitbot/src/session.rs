//! Bot session bootstrap: verify the token, then run the RTM loop.

use bitbot_auth::{SlackTokenVerifier, TokenVerifier};
use bitbot_rtm::{EventRouter, RtmClient};

use crate::{BitbotError, BotConfig};

/// Runs one bot session with the stock `auth.test` verifier.
///
/// The verifier talks to the same Web API base URL as `rtm.start`.
pub async fn run(config: BotConfig, router: &EventRouter) -> BitbotError {
    let verifier = SlackTokenVerifier::with_base_url(config.rtm.api_base_url.clone());
    run_session(config, &verifier, router).await
}

/// Verifies the token, then dials and listens until the session fails.
///
/// Only returns on error. A token that `verifier` rejects ends the session
/// with [`BitbotError::TokenNotVerified`] before any socket is opened.
/// There is no reconnect; call again to start a fresh session.
pub async fn run_session<V>(config: BotConfig, verifier: &V, router: &EventRouter) -> BitbotError
where
    V: TokenVerifier,
{
    tracing::debug!("verifying token");
    match verifier.verify(&config.token).await {
        Ok(true) => {}
        Ok(false) => return BitbotError::TokenNotVerified,
        Err(e) => return e.into(),
    }

    tracing::info!(routes = router.len(), "token verified, starting RTM session");
    RtmClient::new(config.rtm)
        .dial_and_listen(&config.token, router)
        .await
        .into()
}
