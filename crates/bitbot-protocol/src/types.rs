//! Response shapes for the HTTP endpoints, typed event payloads, and the
//! passive Slack records that flow through handlers.
//!
//! None of these types carry behavior. Fields the service may omit are
//! `#[serde(default)]` so a sparse response still decodes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// HTTP endpoint responses
// ---------------------------------------------------------------------------

/// Response from the `rtm.start` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    /// True if the RTM stream can begin.
    pub ok: bool,
    /// Error text from the service when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One-time socket URL. Must be dialed within 30 seconds of issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Response from the `auth.test` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTestResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Typed event payloads
// ---------------------------------------------------------------------------

/// `{"type":"hello"}`, sent once the socket is ready for traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {}

/// A chat message event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

/// Reply to a `ping`, echoing the ping's `id` in `reply_to`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    #[serde(default)]
    pub reply_to: Option<u64>,
}

// ---------------------------------------------------------------------------
// Slack records
// ---------------------------------------------------------------------------

/// Free-form preferences attached to users and teams.
pub type Preferences = Map<String, Value>;

/// A named property (topic, purpose) attached to channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub value: String,
    /// User ID of whoever set the property.
    pub creator: String,
    /// Unix timestamp of the last change.
    pub last_set: i64,
}

/// A team channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Channel name without the leading `#`.
    pub name: String,
    #[serde(default)]
    pub is_channel: bool,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub is_archived: bool,
    /// The channel every regular member belongs to (usually `#general`).
    #[serde(default)]
    pub is_general: bool,
    /// User IDs in the channel, including disabled accounts.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Property>,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read: Option<String>,
    #[serde(default)]
    pub unread_count: i64,
    /// Unread messages that matter to the user (no join/leave noise).
    #[serde(default)]
    pub unread_count_display: i64,
}

/// The connected user's own account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub prefs: Preferences,
    #[serde(default)]
    pub created: i64,
    /// `active` or `manual`.
    #[serde(default)]
    pub manual_presence: String,
}

/// A team the user belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email_domain: String,
    #[serde(default)]
    pub domain: String,
    /// Minutes a message stays editable, or -1 for no limit.
    #[serde(default)]
    pub msg_edit_window_mins: i64,
    #[serde(default)]
    pub over_storage_limit: bool,
    #[serde(default)]
    pub prefs: Preferences,
    #[serde(default)]
    pub plan: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_start_response_rejected() {
        let r: StartResponse =
            serde_json::from_value(json!({"ok": false, "error": "invalid_auth"})).unwrap();
        assert!(!r.ok);
        assert_eq!(r.error.as_deref(), Some("invalid_auth"));
        assert_eq!(r.url, None);
    }

    #[test]
    fn test_start_response_ignores_unknown_fields() {
        let r: StartResponse = serde_json::from_value(json!({
            "ok": true,
            "url": "wss://ms9.slack-msgs.com/websocket/7I5yBpcvk",
            "self": {"id": "U023BECGF", "name": "bobby"},
            "channels": []
        }))
        .unwrap();
        assert!(r.ok);
        assert!(r.url.unwrap().starts_with("wss://"));
    }

    #[test]
    fn test_channel_with_topic() {
        let ch: Channel = serde_json::from_value(json!({
            "id": "C024BE91L",
            "name": "fun",
            "is_channel": true,
            "members": ["U024BE7LH"],
            "topic": {"value": "Fun times", "creator": "U024BE7LV", "last_set": 1369677212}
        }))
        .unwrap();
        assert_eq!(ch.name, "fun");
        assert_eq!(ch.topic.unwrap().value, "Fun times");
        assert!(ch.purpose.is_none());
    }

    #[test]
    fn test_team_prefs_are_free_form() {
        let team: Team = serde_json::from_value(json!({
            "id": "T024BE7LD",
            "name": "Example",
            "msg_edit_window_mins": -1,
            "prefs": {"default_channels": ["C024BE91L"]}
        }))
        .unwrap();
        assert_eq!(team.msg_edit_window_mins, -1);
        assert!(team.prefs.contains_key("default_channels"));
    }
}
