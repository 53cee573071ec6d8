//! Interactive terminal chat client
//!
//! Posts each line typed at the prompt to a running server's `/api/chat`
//! endpoint, then reveals the formatted reply through the typewriter.

use super::output::Output;
use crate::format::format_message;
use crate::typewriter::{ScrollTracker, TerminalSink, Typewriter, play};
use crate::types::{AppError, ChatReply, ChatRequest, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Shown in place of a reply when the server cannot be reached or answers
/// with something unreadable.
pub const CLIENT_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];
const CLEAR_COMMAND: &str = "/clear";

/// Settings for a terminal chat session
pub struct ChatClientConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:8000`
    pub server: String,
    /// Session id every message is sent under
    pub session_id: String,
    /// Delay between typewriter ticks
    pub tick: Duration,
}

/// Thin HTTP client for the chat API.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Sends one message and returns the server's reply.
    ///
    /// Absorbed upstream failures (`error: true`) still arrive as a reply;
    /// only transport errors and non-2xx statuses are errors here.
    pub async fn send(&self, session_id: &str, message: &str) -> Result<ChatReply> {
        let request = ChatRequest {
            message: Some(Value::String(message.to_string())),
            session_id: Some(Value::String(session_id.to_string())),
            context: None,
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "server returned {}",
                response.status()
            )));
        }

        Ok(response.json::<ChatReply>().await?)
    }

    /// Clears the session on the server.
    pub async fn clear(&self, session_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/api/conversation/{}", self.base_url, session_id))
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Session id for a client that was not given one.
pub fn generate_session_id() -> String {
    format!("session_{}", chrono::Utc::now().timestamp_millis())
}

/// Runs the read-send-reveal loop until end of input or `/quit`.
pub async fn run(config: ChatClientConfig, output: &Output) -> anyhow::Result<()> {
    let client = ChatClient::new(&config.server);

    output.banner();
    output.kv("Server", &config.server);
    output.kv("Session", &config.session_id);
    output.hint("Type /clear to forget this session, /quit to leave");
    output.newline();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        output.prompt();
        let Some(line) = lines.next_line().await? else {
            output.newline();
            break;
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&message) {
            break;
        }
        if message == CLEAR_COMMAND {
            match client.clear(&config.session_id).await {
                Ok(()) => output.success("Conversation cleared"),
                Err(e) => output.error(&format!("Failed to clear conversation: {}", e)),
            }
            continue;
        }

        let reply = match client.send(&config.session_id, message).await {
            Ok(reply) => reply.reply,
            Err(e) => {
                tracing::debug!("Chat request failed: {}", e);
                CLIENT_ERROR_REPLY.to_string()
            }
        };

        output.bot_label();
        reveal(&reply, config.tick, output.colored).await;
    }

    Ok(())
}

/// Formats a reply and types it out on stdout.
pub async fn reveal(reply: &str, tick: Duration, colored: bool) -> String {
    let mut sink = TerminalSink::new(std::io::stdout(), colored);
    let scroll = Mutex::new(ScrollTracker::default());
    play(Typewriter::new(format_message(reply)), tick, &mut sink, &scroll).await
}
