//! Core components, types, and utilities for the history-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Typed inbound events and chat platform data.
//! - Common types and result handling.

pub mod config;
pub mod types;
