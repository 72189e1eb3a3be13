//! Event handling and user interactions for history-bot.
//!
//! This module provides functionality for handling Slack event deliveries:
//! - Verifying and parsing incoming webhook requests
//! - Routing events by type and subtype
//! - Summarizing recent channel history in reply to messages

pub mod dispatcher;
pub mod signature;
pub mod webhook;
