//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Chat relay handler.
pub mod chat;
/// Conversation inspection and clearing handlers.
pub mod conversations;
/// Health check handler.
pub mod health;
