use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// ============= API Request/Response Types =============

/// Body of `POST /api/chat`.
///
/// Every field is kept as a raw JSON value. Only `message` is validated;
/// a malformed `sessionId` or `context` is coerced or ignored rather than
/// failing the whole body.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Value>,
    /// Preference updates merged into the session before forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ChatRequest {
    /// Returns the trimmed message text, or an error if it is missing or blank.
    pub fn validated_message(&self) -> Result<&str> {
        match self.message.as_ref().and_then(Value::as_str).map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(AppError::InvalidInput("Message is required".to_string())),
        }
    }

    /// Trimmed session id. Numbers are taken as their decimal form; blanks
    /// and other JSON types count as absent.
    pub fn session_id(&self) -> Option<String> {
        let id = match self.session_id.as_ref()? {
            Value::String(id) => id.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!id.is_empty()).then_some(id)
    }

    /// Preference updates, when `context` is a JSON object.
    pub fn preferences(&self) -> Option<&Map<String, Value>> {
        self.context.as_ref()?.as_object()
    }
}

/// Reply returned by `POST /api/chat`.
///
/// Successful relays carry the session id and timestamp; absorbed upstream
/// failures carry `error: true` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl ChatReply {
    pub fn success(reply: String, session_id: String) -> Self {
        Self {
            reply,
            session_id: Some(session_id),
            timestamp: Some(now_rfc3339()),
            error: None,
        }
    }

    pub fn fallback(reply: String) -> Self {
        Self {
            reply,
            session_id: None,
            timestamp: None,
            error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
}

/// Stored context for one session, as returned by the inspection endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub session_id: String,
    pub history: Vec<Exchange>,
    pub preferences: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub exchanges: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

// ============= Conversation Types =============

/// One user message paired with the bot reply it produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exchange {
    pub user: String,
    pub bot: String,
    #[serde(with = "wire_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Payload POSTed to the upstream webhook.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub message: String,
    pub session_id: String,
    pub context: WebhookContext,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookContext {
    pub history: Vec<Exchange>,
    pub user_preferences: Map<String, Value>,
}

/// Current time formatted the way every timestamp on the wire is.
pub fn now_rfc3339() -> String {
    format_timestamp(&Utc::now())
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2026-06-10T09:30:00.000Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod wire_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        ts: &DateTime<Utc>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::Upstream(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
