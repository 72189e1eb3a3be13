//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the history-bot:
//! - Chat services (e.g., the Slack Web API), with a user profile cache
//! - Secret resolution for the app credentials
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod secret;
