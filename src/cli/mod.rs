//! CLI module for Courier
//!
//! Provides command-line interface parsing and handling for the courier-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod chat;
pub mod init;
pub mod output;

use crate::utils::toml_config::{ConfigError, CourierConfig};
use clap::{Parser, Subcommand};
use output::Output;
use std::path::{Path, PathBuf};

/// Courier - chat relay server
///
/// Relays chat widget messages to an automation webhook (such as an n8n flow)
/// and keeps short per-session conversation context.
#[derive(Parser, Debug)]
#[command(
    name = "courier-server",
    version,
    about = "Courier - chat relay server for webhook-backed chatbots",
    long_about = "Relays chat widget messages to an automation webhook (such as an n8n flow),\n\
                  normalizes its replies and keeps short per-session conversation context.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a new project.",
    after_help = "EXAMPLES:\n    \
                  courier-server init                         # Scaffold courier.toml and the chat UI\n    \
                  courier-server                              # Start the server (requires courier.toml)\n    \
                  courier-server --config my.toml             # Use a custom config file\n    \
                  courier-server chat --session demo          # Chat from the terminal"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "courier.toml", env = "COURIER_CONFIG", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new Courier project
    ///
    /// Creates courier.toml, .env.example and the static chat UI under public/.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// Webhook URL to relay messages to
        #[arg(long)]
        webhook_url: Option<String>,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Chat with a running server from the terminal
    Chat {
        /// Base URL of the Courier server
        #[arg(short, long, default_value = "http://127.0.0.1:8000")]
        server: String,

        /// Session id to chat under (a new one is generated when omitted)
        #[arg(long)]
        session: Option<String>,

        /// Typewriter delay per character, in milliseconds
        #[arg(long, default_value = "15")]
        speed: u64,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Runs the `config` subcommand.
pub fn show_config(
    path: &Path,
    full: bool,
    validate: bool,
    output: &Output,
) -> Result<(), ConfigError> {
    output.header("Configuration");
    output.kv("File", &path.display().to_string());

    let config = CourierConfig::load(path)?;

    if validate {
        config.validate()?;
        output.success("Configuration is valid");
    }

    if full {
        output.newline();
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    output.kv("Listen", &config.bind_address());
    output.kv("Webhook", &config.webhook_url());
    output.kv("Timeout", &format!("{}s", config.webhook.timeout_secs));
    output.kv("Reply fields", &config.webhook.reply_fields.join(", "));
    output.kv("History limit", &config.session.history_limit.to_string());
    output.kv("Static UI", &config.server.static_dir.display().to_string());
    Ok(())
}
