//! Runtime services and shared state for the history-bot.

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{dispatcher::EventDispatcher, webhook},
    service::{
        chat::{ChatClient, profile_cache::ProfileCache},
        secret::{Credentials, SecretProvider},
    },
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration and the event dispatcher.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The event dispatcher instance.
    pub dispatcher: EventDispatcher,
}

impl Runtime {
    /// Create a new runtime instance, resolving credentials from the configured secrets.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        let secrets = SecretProvider::config(&config);

        Self::with_secrets(config, &secrets).await
    }

    /// Create a new runtime instance with an explicit secret provider.
    pub async fn with_secrets(config: Config, secrets: &SecretProvider) -> Res<Self> {
        // Resolve the credentials; the bot cannot run without them.
        let credentials = Credentials::resolve(secrets, &config.environment).await?;

        // Initialize the slack client.
        let chat = ChatClient::slack(&config, &credentials, ProfileCache::new())?;

        let dispatcher = EventDispatcher::new(credentials, chat);

        Ok(Self { config, dispatcher })
    }

    /// The webhook router for this runtime.
    pub fn router(&self) -> Router {
        webhook::router(&self.config, self.dispatcher.clone())
    }

    /// Serve the webhook until Ctrl-C.
    pub async fn start(&self) -> Void {
        let listener = TcpListener::bind(&self.config.bind_address).await?;

        info!("Listening for Slack events on {}{} ...", listener.local_addr()?, self.config.events_path);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down ...");
            })
            .await?;

        Ok(())
    }
}
