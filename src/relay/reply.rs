//! Upstream reply shapes and the ordered extraction policy.
//!
//! The webhook is user-configurable, so its response body has no fixed
//! contract. Bodies are classified into [`UpstreamReply`] once and the
//! display text is pulled out by a [`ReplyExtractor`].

use serde_json::{Map, Value};

/// Candidate keys checked, in order, when the upstream returns an object.
pub const DEFAULT_REPLY_FIELDS: [&str; 4] = ["reply", "response", "output", "text"];

/// Generic reply used when the upstream answered but nothing usable was found.
pub const DEFAULT_GENERIC_REPLY: &str = "I received your message but need more context.";

/// Classified upstream response body.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamReply {
    /// Empty or whitespace-only body.
    Empty,
    /// A raw text body, or a JSON string.
    Text(String),
    /// A JSON object (n8n's single-item arrays are unwrapped to this).
    Object(Map<String, Value>),
    /// Any other JSON value.
    Other(Value),
}

impl UpstreamReply {
    /// Classifies a raw response body.
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return UpstreamReply::Empty;
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => UpstreamReply::Text(body.to_string()),
        }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => UpstreamReply::Text(text),
            Value::Object(map) => UpstreamReply::Object(map),
            Value::Array(mut items) if matches!(items.first(), Some(Value::Object(_))) => {
                match items.swap_remove(0) {
                    Value::Object(map) => UpstreamReply::Object(map),
                    other => UpstreamReply::Other(other),
                }
            }
            other => UpstreamReply::Other(other),
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamReply::Empty => "empty",
            UpstreamReply::Text(_) => "text",
            UpstreamReply::Object(_) => "object",
            UpstreamReply::Other(_) => "other",
        }
    }
}

/// Pulls the display string out of an [`UpstreamReply`].
#[derive(Debug, Clone)]
pub struct ReplyExtractor {
    fields: Vec<String>,
}

impl Default for ReplyExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_FIELDS.iter().map(|f| f.to_string()).collect())
    }
}

impl ReplyExtractor {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the first non-empty string among the candidate fields, or the
    /// body itself when it is text. `None` means the caller should use its
    /// generic reply.
    pub fn extract(&self, reply: &UpstreamReply) -> Option<String> {
        match reply {
            UpstreamReply::Text(text) => non_empty(text),
            UpstreamReply::Object(map) => self
                .fields
                .iter()
                .filter_map(|field| map.get(field))
                .find_map(|value| value.as_str().and_then(non_empty)),
            UpstreamReply::Empty | UpstreamReply::Other(_) => None,
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
