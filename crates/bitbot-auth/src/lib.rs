//! API token verification for Bitbot.
//!
//! Before opening an RTM session the bot checks that its token is accepted
//! by the service's `auth.test` endpoint. Only the boolean outcome matters
//! to the bootstrap; the [`TokenVerifier`] trait keeps that call swappable
//! so the bootstrap can run against a fake in tests.

mod auth;
mod error;

pub use auth::{SlackTokenVerifier, TokenVerifier, DEFAULT_API_BASE_URL};
pub use error::AuthError;
