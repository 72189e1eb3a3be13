//! Routes inbound events and produces the channel history summary reply.

use tracing::{error, info, instrument, warn};

use crate::{
    base::types::{HistoryMessage, InboundEvent, InnerEvent, MessageEvent},
    service::{chat::ChatClient, secret::Credentials},
};

/// Posted in place of the summary when the history could not be fetched.
pub const HISTORY_ERROR_TEXT: &str = "Error getting conversation history";

/// Number of most recent messages included in a summary.
pub const SUMMARY_MESSAGE_COUNT: usize = 3;

/// Characters of each message kept in a summary line.
pub const SUMMARY_TEXT_CHARS: usize = 141;

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The verification challenge, to be returned verbatim as the response body.
    Challenge(String),
    /// A reply was attempted for a message event.
    Replied(Delivery),
    /// Nothing to do (self-authored, or an unrecognized event).
    Ignored,
}

impl DispatchOutcome {
    /// The HTTP response body, if the event calls for one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Challenge(challenge) => Some(challenge.as_str()),
            _ => None,
        }
    }
}

/// Result of posting a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { response: String },
    Failed { reason: String },
}

/// Dispatches inbound events for one Slack app.
///
/// Owns the app credentials for its lifetime; trivially cloneable.
#[derive(Clone)]
pub struct EventDispatcher {
    credentials: Credentials,
    chat: ChatClient,
}

impl EventDispatcher {
    pub fn new(credentials: Credentials, chat: ChatClient) -> Self {
        Self { credentials, chat }
    }

    pub fn app_id(&self) -> &str {
        &self.credentials.app_id
    }

    /// Handle one event. Recoverable failures are logged and never escape.
    #[instrument(skip_all, fields(kind = event.kind()))]
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        info!("Slack event: {}", event.kind());

        match event {
            InboundEvent::UrlVerification { challenge } => DispatchOutcome::Challenge(challenge),
            InboundEvent::EventCallback { event } => self.handle_event_callback(event).await,
            InboundEvent::Unrecognized => DispatchOutcome::Ignored,
        }
    }

    async fn handle_event_callback(&self, event: InnerEvent) -> DispatchOutcome {
        match event {
            InnerEvent::Message(message) => self.handle_message(message).await,
            InnerEvent::Unrecognized => DispatchOutcome::Ignored,
        }
    }

    #[instrument(skip_all, fields(channel = %message.channel))]
    async fn handle_message(&self, message: MessageEvent) -> DispatchOutcome {
        info!("Slack message event with text: \"{}\"", message.text.as_deref().unwrap_or_default());

        if self.is_from_me(&message) {
            info!("Skipping message event from this app.");
            return DispatchOutcome::Ignored;
        }

        if message.channel.is_empty() {
            warn!("Skipping message event without a channel.");
            return DispatchOutcome::Ignored;
        }

        let text = match self.chat.get_conversation_history(&message.channel).await {
            Some(history) => format_summary(&history),
            None => HISTORY_ERROR_TEXT.to_string(),
        };

        match self.chat.post_message(&message.channel, &text).await {
            Ok(response) => DispatchOutcome::Replied(Delivery::Sent { response }),
            Err(err) => {
                error!("Error sending message: {}", err);
                DispatchOutcome::Replied(Delivery::Failed { reason: err.to_string() })
            }
        }
    }

    fn is_from_me(&self, message: &MessageEvent) -> bool {
        message.app_id.as_deref() == Some(self.credentials.app_id.as_str())
    }
}

/// Format the most recent messages (given newest first) oldest first, separated by a blank line.
pub fn format_summary(history: &[HistoryMessage]) -> String {
    let recent = &history[..history.len().min(SUMMARY_MESSAGE_COUNT)];

    recent.iter().rev().map(format_line).collect::<Vec<_>>().join("\n\n")
}

fn format_line(message: &HistoryMessage) -> String {
    let real_name = message.user_profile.as_ref().and_then(|p| p.real_name()).unwrap_or_else(|| {
        warn!("No real name for user `{}`.", message.user_id);
        ""
    });

    format!("{} said: {}", real_name, truncate_chars(&message.message, SUMMARY_TEXT_CHARS))
}

/// The first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use mockall::{mock, predicate::eq};
    use serde_json::json;

    use super::*;
    use crate::{
        base::types::{Res, UserProfile},
        service::chat::GenericChatClient,
    };

    mock! {
        pub Chat {}

        #[async_trait]
        impl GenericChatClient for Chat {
            async fn post_message(&self, channel_id: &str, text: &str) -> Res<String>;
            async fn get_conversation_history(&self, channel_id: &str) -> Option<Vec<HistoryMessage>>;
            async fn get_user_profile(&self, user_id: &str) -> Option<UserProfile>;
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            app_id: "A_SELF".to_string(),
            access_token: "xoxb-test".to_string(),
        }
    }

    fn dispatcher(mock: MockChat) -> EventDispatcher {
        EventDispatcher::new(credentials(), ChatClient::new(Arc::new(mock)))
    }

    fn history_message(user_id: &str, name: Option<&str>, text: &str) -> HistoryMessage {
        HistoryMessage {
            user_id: user_id.to_string(),
            user_profile: name.map(|n| serde_json::from_value(json!({ "real_name": n })).unwrap()),
            message: text.to_string(),
        }
    }

    fn message_event(app_id: Option<&str>) -> InboundEvent {
        InboundEvent::EventCallback {
            event: InnerEvent::Message(MessageEvent {
                channel: "C1".to_string(),
                text: Some("hello".to_string()),
                app_id: app_id.map(str::to_string),
            }),
        }
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let mut mock = MockChat::new();
        mock.expect_get_conversation_history().never();
        mock.expect_post_message().never();

        let challenge = "  3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P ünïcødé\n".to_string();
        let outcome = dispatcher(mock).dispatch(InboundEvent::UrlVerification { challenge: challenge.clone() }).await;

        assert_eq!(outcome.response_body(), Some(challenge.as_str()));
    }

    #[tokio::test]
    async fn test_self_authored_message_is_ignored() {
        let mut mock = MockChat::new();
        mock.expect_get_conversation_history().never();
        mock.expect_post_message().never();

        let outcome = dispatcher(mock).dispatch(message_event(Some("A_SELF"))).await;

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(outcome.response_body(), None);
    }

    #[tokio::test]
    async fn test_message_without_channel_is_ignored() {
        let mut mock = MockChat::new();
        mock.expect_get_conversation_history().never();
        mock.expect_post_message().never();

        let event = InboundEvent::EventCallback {
            event: InnerEvent::Message(MessageEvent {
                text: Some("hello".to_string()),
                ..Default::default()
            }),
        };

        assert_eq!(dispatcher(mock).dispatch(event).await, DispatchOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_unrecognized_events_are_ignored() {
        let mut mock = MockChat::new();
        mock.expect_get_conversation_history().never();
        mock.expect_post_message().never();
        let dispatcher = dispatcher(mock);

        assert_eq!(dispatcher.dispatch(InboundEvent::Unrecognized).await, DispatchOutcome::Ignored);
        assert_eq!(dispatcher.dispatch(InboundEvent::EventCallback { event: InnerEvent::Unrecognized }).await, DispatchOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_history_failure_posts_placeholder() {
        let mut mock = MockChat::new();
        mock.expect_get_conversation_history().with(eq("C1")).times(1).returning(|_| None);
        mock.expect_post_message()
            .with(eq("C1"), eq(HISTORY_ERROR_TEXT))
            .times(1)
            .returning(|_, _| Ok(r#"{"ok":true}"#.to_string()));

        let outcome = dispatcher(mock).dispatch(message_event(Some("A_OTHER"))).await;

        assert_eq!(outcome, DispatchOutcome::Replied(Delivery::Sent { response: r#"{"ok":true}"#.to_string() }));
    }

    #[tokio::test]
    async fn test_summary_uses_three_newest_oldest_first() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let sink = posted.clone();

        let mut mock = MockChat::new();
        mock.expect_get_conversation_history().times(1).returning(|_| {
            Some(vec![
                history_message("U1", Some("Ada"), "m0"),
                history_message("U2", Some("Grace"), "m1"),
                history_message("U3", Some("Alan"), "m2"),
                history_message("U4", Some("Edsger"), "m3"),
            ])
        });
        mock.expect_post_message().times(1).returning(move |channel, text| {
            sink.lock().unwrap().push((channel.to_string(), text.to_string()));
            Ok("{}".to_string())
        });

        dispatcher(mock).dispatch(message_event(None)).await;

        let posted = posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "C1");
        assert_eq!(posted[0].1, "Alan said: m2\n\nGrace said: m1\n\nAda said: m0");
    }

    #[tokio::test]
    async fn test_post_failure_is_absorbed() {
        let mut mock = MockChat::new();
        mock.expect_get_conversation_history().returning(|_| Some(vec![history_message("U1", Some("Ada"), "hi")]));
        mock.expect_post_message().times(1).returning(|_, _| Err(anyhow::anyhow!("Slack rejected message: not_in_channel")));

        let outcome = dispatcher(mock).dispatch(message_event(Some("A_OTHER"))).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Replied(Delivery::Failed {
                reason: "Slack rejected message: not_in_channel".to_string()
            })
        );
    }

    #[test]
    fn test_format_summary_truncates_text() {
        let long = "a".repeat(140) + "b" + &"c".repeat(59);
        assert_eq!(long.chars().count(), 200);

        let summary = format_summary(&[history_message("U1", Some("Ada"), &long)]);

        assert_eq!(summary, format!("Ada said: {}b", "a".repeat(140)));
    }

    #[test]
    fn test_format_summary_handles_short_and_missing() {
        assert_eq!(format_summary(&[]), "");

        let summary = format_summary(&[history_message("U2", Some("Grace"), "second"), history_message("U1", None, "first")]);

        assert_eq!(summary, " said: first\n\nGrace said: second");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 141), "short");
        assert_eq!(truncate_chars("", 141), "");
    }
}
