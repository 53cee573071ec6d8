//! Chat relay: forwards a user message with its session context to the
//! upstream webhook, normalizes whatever comes back and records the exchange.
//!
//! Upstream failures never reach the caller as errors. A network error,
//! timeout or non-2xx status turns into a canned apology chosen by the
//! configured [`FallbackPolicy`], flagged with `error: true`.

pub mod fallback;
pub mod reply;

pub use fallback::{FallbackPolicy, FixedFallback, RandomFallback, SeededFallback};
pub use reply::{ReplyExtractor, UpstreamReply};

use crate::memory::ContextStore;
use crate::types::{
    AppError, ChatReply, ChatRequest, Exchange, Result, WebhookContext, WebhookPayload,
    now_rfc3339,
};
use crate::utils::toml_config::CourierConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where and how long to wait for the upstream webhook.
#[derive(Debug, Clone)]
pub struct WebhookTarget {
    pub url: String,
    pub timeout: Duration,
}

/// Transport to the upstream automation webhook.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    /// Sends the payload and classifies the response body.
    ///
    /// Any transport failure, timeout or non-2xx status is an error.
    async fn send(&self, target: &WebhookTarget, payload: &WebhookPayload)
    -> Result<UpstreamReply>;
}

/// [`WebhookClient`] over HTTP using a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpWebhookClient {
    http: reqwest::Client,
}

impl HttpWebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn send(
        &self,
        target: &WebhookTarget,
        payload: &WebhookPayload,
    ) -> Result<UpstreamReply> {
        let response = self
            .http
            .post(&target.url)
            .timeout(target.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "webhook responded with status {}",
                status
            )));
        }

        let body = response.text().await?;
        Ok(UpstreamReply::from_body(&body))
    }
}

/// Per-request relay settings, derived from the live configuration.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub target: WebhookTarget,
    pub extractor: ReplyExtractor,
    pub default_session_id: String,
    pub generic_reply: String,
    pub apologies: Vec<String>,
}

impl RelaySettings {
    pub fn from_config(config: &CourierConfig) -> Self {
        Self {
            target: WebhookTarget {
                url: config.webhook_url(),
                timeout: Duration::from_secs(config.webhook.timeout_secs),
            },
            extractor: ReplyExtractor::new(config.webhook.reply_fields.clone()),
            default_session_id: config.session.default_session_id.clone(),
            generic_reply: config.fallback.generic_reply.clone(),
            apologies: config.fallback.apologies.clone(),
        }
    }
}

/// Relays chat messages between sessions and the upstream webhook.
#[derive(Clone)]
pub struct ChatRelay {
    store: Arc<dyn ContextStore>,
    client: Arc<dyn WebhookClient>,
    fallback: Arc<dyn FallbackPolicy>,
}

impl ChatRelay {
    pub fn new(
        store: Arc<dyn ContextStore>,
        client: Arc<dyn WebhookClient>,
        fallback: Arc<dyn FallbackPolicy>,
    ) -> Self {
        Self {
            store,
            client,
            fallback,
        }
    }

    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    /// Handles one chat request.
    ///
    /// Only validation problems are returned as errors; upstream trouble is
    /// absorbed into a fallback reply.
    pub async fn relay(&self, request: &ChatRequest, settings: &RelaySettings) -> Result<ChatReply> {
        let message = request.validated_message()?;
        let session_id = request
            .session_id()
            .unwrap_or_else(|| settings.default_session_id.clone());

        if let Some(preferences) = request.preferences().cloned() {
            self.store.merge_preferences(&session_id, preferences);
        }

        let context = self.store.get(&session_id);
        let payload = WebhookPayload {
            message: message.to_string(),
            session_id: session_id.clone(),
            context: WebhookContext {
                history: context.history.to_vec(),
                user_preferences: context.preferences,
            },
            timestamp: now_rfc3339(),
        };

        debug!(
            session_id = %session_id,
            history = payload.context.history.len(),
            "Forwarding message to webhook"
        );

        match self.client.send(&settings.target, &payload).await {
            Ok(upstream) => {
                let reply = match settings.extractor.extract(&upstream) {
                    Some(text) => text,
                    None => {
                        warn!(
                            session_id = %session_id,
                            kind = upstream.kind(),
                            "Webhook reply had no usable text, using generic reply"
                        );
                        settings.generic_reply.clone()
                    }
                };

                self.store
                    .append(&session_id, Exchange::new(message, reply.clone()));
                info!(session_id = %session_id, "Relayed chat message");

                Ok(ChatReply::success(reply, session_id))
            }
            Err(e) => {
                error!(session_id = %session_id, "Error processing chat message: {}", e);
                let reply = self
                    .fallback
                    .pick(&settings.apologies)
                    .unwrap_or(&settings.generic_reply)
                    .to_string();
                Ok(ChatReply::fallback(reply))
            }
        }
    }
}
