//! Slack Web API implementation of the chat client.
//!
//! Three calls are made, all with `Authorization: Bearer <token>`:
//! - `chat.postMessage` (form-encoded POST)
//! - `conversations.history` (GET, `channel` query)
//! - `users.profile.get` (GET, `user` query), fronted by the [`ProfileCache`]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{HistoryMessage, Res, UserProfile},
    },
    service::secret::Credentials,
};

use super::{ChatClient, GenericChatClient, profile_cache::ProfileCache};

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub fn slack(config: &Config, credentials: &Credentials, cache: ProfileCache) -> Res<Self> {
        let client = SlackChatClient::new(config, credentials, cache)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Wire types.

/// The envelope every Slack Web API response shares.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<RawHistoryMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHistoryMessage {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    ok: bool,
    #[serde(default)]
    profile: Option<UserProfile>,
    #[serde(default)]
    error: Option<String>,
}

// Structs.

/// Slack client implementation.
#[derive(Clone)]
pub struct SlackChatClient {
    base_url: String,
    access_token: String,
    http: reqwest::Client,
    cache: ProfileCache,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub fn new(config: &Config, credentials: &Credentials, cache: ProfileCache) -> Res<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(secs) = config.http_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: config.slack_api_base_url.trim_end_matches('/').to_string(),
            access_token: credentials.access_token.clone(),
            http: builder.build()?,
            cache,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn fetch_history(&self, channel_id: &str) -> Res<HistoryResponse> {
        let response = self
            .http
            .get(self.url("conversations.history"))
            .bearer_auth(&self.access_token)
            .query(&[("channel", channel_id)])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn fetch_profile(&self, user_id: &str) -> Res<ProfileResponse> {
        let response = self
            .http
            .get(self.url("users.profile.get"))
            .bearer_auth(&self.access_token)
            .query(&[("user", user_id)])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    #[instrument(skip(self, text))]
    async fn post_message(&self, channel_id: &str, text: &str) -> Res<String> {
        let body = self
            .http
            .post(self.url("chat.postMessage"))
            .bearer_auth(&self.access_token)
            .form(&[("channel", channel_id), ("text", text)])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?
            .error_for_status()?
            .text()
            .await?;

        info!("Sent message to Slack: {}", body);

        if let Ok(ApiStatus { ok: false, error }) = serde_json::from_str::<ApiStatus>(&body) {
            return Err(anyhow::anyhow!("Slack rejected message: {}", error.unwrap_or_default()));
        }

        Ok(body)
    }

    #[instrument(skip(self))]
    async fn get_conversation_history(&self, channel_id: &str) -> Option<Vec<HistoryMessage>> {
        let messages = match self.fetch_history(channel_id).await {
            Ok(HistoryResponse { ok: true, messages, .. }) => messages,
            Ok(HistoryResponse { error, .. }) => {
                error!("Error getting conversation history: {}", error.unwrap_or_default());
                return None;
            }
            Err(e) => {
                error!("Error getting conversation history: {}", e);
                return None;
            }
        };

        // Profiles are looked up one at a time, in history order.
        let mut history = Vec::with_capacity(messages.len());

        for message in messages {
            let user_id = message.user.unwrap_or_default();
            let user_profile = if user_id.is_empty() { None } else { self.get_user_profile(&user_id).await };

            history.push(HistoryMessage {
                user_id,
                user_profile,
                message: message.text.unwrap_or_default(),
            });
        }

        debug!("Conversation history: {}", serde_json::to_string(&history).unwrap_or_default());

        Some(history)
    }

    #[instrument(skip(self))]
    async fn get_user_profile(&self, user_id: &str) -> Option<UserProfile> {
        if let Some(profile) = self.cache.get(user_id, Utc::now()) {
            debug!("Profile cache hit.");
            return Some(profile);
        }

        match self.fetch_profile(user_id).await {
            Ok(ProfileResponse { ok: true, profile: Some(profile), .. }) => {
                debug!("User profile: {:?}", profile);
                self.cache.put(user_id, profile.clone(), Utc::now());
                Some(profile)
            }
            Ok(ProfileResponse { ok: true, profile: None, .. }) => {
                error!("Error getting user profile: response carried no profile");
                None
            }
            Ok(ProfileResponse { error, .. }) => {
                error!("Error getting user profile: {}", error.unwrap_or_default());
                None
            }
            Err(e) => {
                error!("Error getting user profile: {}", e);
                None
            }
        }
    }
}

// Tests.
