//! # Courier
//!
//! A chat relay server. A browser chat widget posts user messages to Courier,
//! which forwards them (together with the session's recent history) to an
//! automation webhook such as an n8n flow, normalizes whatever the webhook
//! returns, and relays the reply back.
//!
//! ## Overview
//!
//! Courier can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `courier-server` binary
//! 2. **As a library** - Mount [`api::routes::build_app`] in your own service,
//!    or use the formatter and typewriter on their own
//!
//! ### Embedding the relay
//!
//! ```rust,ignore
//! use courier::{AppState, ConfigManager, CourierConfig};
//! use std::sync::Arc;
//!
//! let config = Arc::new(ConfigManager::from_config(CourierConfig::default()));
//! let app = courier::api::routes::build_app(AppState::new(config));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ### Formatting and revealing a reply
//!
//! ```rust
//! use courier::format::format_message;
//! use courier::typewriter::{Frame, Typewriter};
//!
//! let html = format_message("**Seats**\n* CSE\n* ECE");
//! let mut typewriter = Typewriter::new(html);
//! while let Frame::Partial(_partial) = typewriter.tick() {}
//! assert!(typewriter.is_done());
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`cli`] - Server binary commands and the terminal chat client
//! - [`memory`] - Per-session conversation context store
//! - [`relay`] - Webhook client, reply normalization, fallback policy
//! - [`format`] - Reply text to HTML markup
//! - [`typewriter`] - Incremental, tag-aware reveal of formatted replies
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration with hot reloading

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface for the server binary.
pub mod cli;
/// Reply formatting.
pub mod format;
/// Session conversation context.
pub mod memory;
/// Upstream webhook relay.
pub mod relay;
/// Typewriter reveal of formatted replies.
pub mod typewriter;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use memory::{ContextStore, InMemoryContextStore};
pub use relay::{ChatRelay, FallbackPolicy, HttpWebhookClient, WebhookClient};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, CourierConfig};

use relay::RandomFallback;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration with hot-reload support
    pub config_manager: Arc<ConfigManager>,
    /// Session context store
    pub store: Arc<dyn ContextStore>,
    /// Relay to the upstream webhook, sharing `store`
    pub relay: Arc<ChatRelay>,
}

impl AppState {
    /// Production wiring: in-memory store, HTTP webhook client and uniformly
    /// random fallback selection.
    ///
    /// The history limit is read once here; later config reloads do not
    /// resize existing sessions.
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        let history_limit = config_manager.config().session.history_limit;
        Self::with_components(
            config_manager,
            Arc::new(InMemoryContextStore::new(history_limit)),
            Arc::new(HttpWebhookClient::new()),
            Arc::new(RandomFallback),
        )
    }

    pub fn with_components(
        config_manager: Arc<ConfigManager>,
        store: Arc<dyn ContextStore>,
        client: Arc<dyn WebhookClient>,
        fallback: Arc<dyn FallbackPolicy>,
    ) -> Self {
        let relay = Arc::new(ChatRelay::new(store.clone(), client, fallback));
        Self {
            config_manager,
            store,
            relay,
        }
    }
}
