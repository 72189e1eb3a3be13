pub mod profile_cache;
pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{HistoryMessage, Res, UserProfile};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the outbound calls the dispatcher makes against a chat
/// platform. Lookups collapse every failure into `None` after logging it, so
/// callers can continue with degraded output.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Post `text` to a channel.
    ///
    /// Returns the raw platform response on success. The dispatcher only logs
    /// failures, but the result is kept so stricter callers can assert on delivery.
    async fn post_message(&self, channel_id: &str, text: &str) -> Res<String>;

    /// Get the recent history of a channel, newest first, with author profiles attached.
    ///
    /// Returns `None` if the history itself could not be retrieved.
    async fn get_conversation_history(&self, channel_id: &str) -> Option<Vec<HistoryMessage>>;

    /// Get a user's profile, served from cache while fresh.
    async fn get_user_profile(&self, user_id: &str) -> Option<UserProfile>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
