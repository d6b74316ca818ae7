//! Bot configuration from the environment.

use std::fmt;

use bitbot_rtm::RtmConfig;

use crate::BitbotError;

/// Bot token. Required.
pub const TOKEN_VAR: &str = "BITBOT_TOKEN";
/// `Origin` header for the socket handshake. Optional.
pub const ORIGIN_VAR: &str = "BITBOT_ORIGIN";
/// Web API base URL override. Optional.
pub const API_URL_VAR: &str = "BITBOT_API_URL";

/// Everything needed to run one bot session.
#[derive(Clone)]
pub struct BotConfig {
    /// Token passed to `auth.test` and `rtm.start`.
    pub token: String,
    /// Connection settings for the RTM client.
    pub rtm: RtmConfig,
}

impl BotConfig {
    /// Creates a configuration for `token` with default RTM settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            rtm: RtmConfig::default(),
        }
    }

    /// Replaces the RTM connection settings.
    pub fn with_rtm_config(mut self, rtm: RtmConfig) -> Self {
        self.rtm = rtm;
        self
    }

    /// Reads the configuration from process environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// # Errors
    /// `BitbotError::Config` when `BITBOT_TOKEN` is unset or blank.
    pub fn from_env() -> Result<Self, BitbotError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BitbotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BitbotError::Config(format!("{TOKEN_VAR} is not set")))?;

        let mut rtm = RtmConfig::default();
        if let Some(origin) = lookup(ORIGIN_VAR) {
            rtm = rtm.with_origin(origin.trim());
        }
        if let Some(url) = lookup(API_URL_VAR).filter(|u| !u.trim().is_empty()) {
            let url = url.trim();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BitbotError::Config(format!(
                    "{API_URL_VAR} must be an http(s) URL, got {url:?}"
                )));
            }
            rtm = rtm.with_api_base_url(url);
        }

        Ok(Self { token, rtm })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("rtm", &self.rtm)
            .finish()
    }
}
