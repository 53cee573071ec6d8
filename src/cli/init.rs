//! Init command implementation
//!
//! Scaffolds a new Courier project: configuration, environment template and
//! the static chat UI.

use super::output::Output;
use crate::relay::fallback::DEFAULT_APOLOGIES;
use crate::utils::toml_config::WEBHOOK_URL_ENV;
use std::fs;
use std::path::{Path, PathBuf};

/// Chat page served from `public/` by default.
const INDEX_HTML: &str = include_str!("../../public/index.html");

const PLACEHOLDER_WEBHOOK_URL: &str = "https://your-instance.app.n8n.cloud/webhook/chat";

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (courier.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Webhook URL written into courier.toml
    pub webhook_url: Option<String>,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Courier Project");

    let base_path = &config.path;

    let config_path = base_path.join("courier.toml");
    if config_path.exists() && !config.force {
        output.warning("courier.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let public_dir = base_path.join("public");
    if let Err(e) = fs::create_dir_all(&public_dir) {
        output.error(&format!("Failed to create public/: {}", e));
        return InitResult::Error(e.to_string());
    }

    let files = [
        ("config", config_path, generate_courier_toml(&config)),
        ("env", base_path.join(".env.example"), generate_env_example()),
        ("ui", public_dir.join("index.html"), INDEX_HTML.to_string()),
    ];

    for (kind, path, content) in &files {
        let display = path
            .strip_prefix(base_path)
            .unwrap_or(path)
            .display()
            .to_string();
        match write_file(path, content, config.force) {
            Ok(true) => output.created(kind, &display),
            Ok(false) => output.skipped(&display, "already exists"),
            Err(e) => {
                output.error(&format!("Failed to create {}: {}", display, e));
                return InitResult::Error(e.to_string());
            }
        }
    }

    output.complete("Courier project initialized successfully!");

    output.header("Next Steps");
    output.newline();
    if config.webhook_url.is_none() {
        output.info("1. Point Courier at your webhook:");
        output.command("# Edit courier.toml [webhook] url, or set it in .env");
        output.command("cp .env.example .env");
        output.newline();
    }
    output.info("Start the server:");
    output.command("courier-server");
    output.newline();
    output.info("Then open the chat UI:");
    output.command(&format!("open http://{}:{}/", config.host, config.port));

    InitResult::Success
}

/// Writes `content` unless the file exists and `force` is off.
/// Returns whether the file was written.
fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn generate_courier_toml(config: &InitConfig) -> String {
    let webhook_url = config
        .webhook_url
        .as_deref()
        .unwrap_or(PLACEHOLDER_WEBHOOK_URL);
    let apologies: String = DEFAULT_APOLOGIES
        .iter()
        .map(|line| format!("    {:?},\n", line))
        .collect();

    format!(
        r#"# Courier configuration
# Reloaded automatically when this file changes.

[server]
host = "{host}"
port = {port}
log_level = "info"
# "text" or "json"
log_format = "text"
# Directory served at /
static_dir = "public"

[webhook]
# Overridden by the {env} environment variable when set
url = "{webhook_url}"
timeout_secs = 100
# Reply fields checked in order; the first non-empty string wins
reply_fields = ["reply", "response", "output", "text"]

[session]
# Exchanges remembered per session and sent with each message
history_limit = 10
default_session_id = "default"

[fallback]
generic_reply = "I received your message but need more context."
apologies = [
{apologies}]
"#,
        host = config.host,
        port = config.port,
        env = WEBHOOK_URL_ENV,
        webhook_url = webhook_url,
        apologies = apologies,
    )
}

fn generate_env_example() -> String {
    format!(
        r#"# Courier environment
# Copy to .env; values here override courier.toml.

{env}={url}

# Log filter, e.g. info or courier=debug,tower_http=debug
RUST_LOG=info
"#,
        env = WEBHOOK_URL_ENV,
        url = PLACEHOLDER_WEBHOOK_URL,
    )
}
