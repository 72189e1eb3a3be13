//! Library root for `history-bot`.
//!
//! History-bot is a Slack Events API webhook designed to:
//! - Answer the endpoint ownership (`url_verification`) handshake
//! - Reply to each channel message with a summary of the most recent history
//! - Ignore its own messages, so replies never loop
//!
//! The bot talks to the Slack Web API with a bearer token resolved once at
//! startup, and keeps a short-lived in-memory cache of user profiles. The
//! architecture is built around traits for the chat platform and the secret
//! store, so each can be swapped or mocked.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the history-bot runtime:
/// - Resolves the Slack app credentials
/// - Creates the runtime context with the chat client and dispatcher
/// - Serves the events webhook
pub async fn start(config: Config) -> Void {
    info!("Starting history-bot ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
