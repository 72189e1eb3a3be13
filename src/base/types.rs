//! Common result aliases, typed inbound events, and chat platform data.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The crate-wide error type.
pub type Err = anyhow::Error;
/// A result carrying [`Err`].
pub type Res<T> = Result<T, Err>;
/// A result with no value.
pub type Void = Res<()>;

// Inbound events.

/// A webhook payload delivered by the Slack Events API.
///
/// Unknown outer `type` values parse to [`InboundEvent::Unrecognized`] so that they
/// can be acknowledged without any action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Endpoint ownership handshake.
    UrlVerification {
        /// One-time token to echo back verbatim.
        challenge: String,
    },
    /// A wrapped platform event.
    EventCallback {
        /// The wrapped event.
        event: InnerEvent,
    },
    /// Any other outer type.
    #[serde(other)]
    Unrecognized,
}

impl InboundEvent {
    /// Parse a raw request body into a typed event.
    pub fn parse(body: &[u8]) -> Res<Self> {
        serde_json::from_slice(body).context("Malformed event payload")
    }

    /// A short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UrlVerification { .. } => "url_verification",
            Self::EventCallback { .. } => "event_callback",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// The `event` body of an `event_callback`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InnerEvent {
    /// A message posted to a channel.
    Message(MessageEvent),
    /// Any other event type.
    #[serde(other)]
    Unrecognized,
}

/// The fields of a `message` event the bot acts on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MessageEvent {
    /// Channel the message was posted to; empty if the payload had none.
    #[serde(default)]
    pub channel: String,
    /// Message text, if any.
    #[serde(default)]
    pub text: Option<String>,
    /// Only present when the message was posted by an app.
    #[serde(default)]
    pub app_id: Option<String>,
}

// Chat platform data.

/// Opaque user profile as returned by `users.profile.get`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(
    /// The raw profile fields.
    pub Map<String, Value>,
);

impl UserProfile {
    /// The `real_name` field, if present and a string.
    pub fn real_name(&self) -> Option<&str> {
        self.0.get("real_name").and_then(Value::as_str)
    }
}

/// A channel history entry enriched with its author's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryMessage {
    /// Author's user ID; empty for messages without a user.
    pub user_id: String,
    /// Absent when the profile lookup failed.
    pub user_profile: Option<UserProfile>,
    /// Message text.
    pub message: String,
}

// Tests.
