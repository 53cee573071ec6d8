use courier::{
    AppState, ConfigManager,
    api::routes::build_app,
    cli::{
        Cli, Commands,
        chat::{self, ChatClientConfig},
        init::{self, InitConfig, InitResult},
        output::Output,
        show_config,
    },
    utils::toml_config::{ConfigError, LogFormat},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let Cli {
        config: config_path,
        verbose,
        no_color,
        command,
    } = Cli::parse_args();
    let output = if no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match command {
        Some(Commands::Init {
            path,
            force,
            webhook_url,
            host,
            port,
        }) => {
            let config = InitConfig {
                path,
                force,
                webhook_url,
                host,
                port,
            };
            match init::run(config, &output) {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!("init failed: {}", e),
            }
        }
        Some(Commands::Config { full, validate }) => {
            if let Err(e) = show_config(&config_path, full, validate, &output) {
                output.error(&e.to_string());
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Chat {
            server,
            session,
            speed,
        }) => {
            init_tracing(if verbose { "debug" } else { "warn" }, LogFormat::Text);
            let config = ChatClientConfig {
                server,
                session_id: session.unwrap_or_else(chat::generate_session_id),
                tick: Duration::from_millis(speed),
            };
            chat::run(config, &output).await
        }
        None => serve(&config_path, verbose, &output).await,
    }
}

async fn serve(config_path: &Path, verbose: bool, output: &Output) -> anyhow::Result<()> {
    let config_manager = match ConfigManager::new(config_path) {
        Ok(manager) => manager,
        Err(ConfigError::FileNotFound(path)) => {
            output.error(&format!("Configuration file not found: {}", path.display()));
            output.hint("Create one with:");
            output.command("courier-server init");
            std::process::exit(1);
        }
        Err(e) => {
            output.error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    let config = config_manager.config();
    let filter = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    init_tracing(filter, config.server.log_format);

    if let Err(e) = config_manager.start_watching() {
        tracing::warn!("Config hot reload disabled: {}", e);
    }

    let config_manager = Arc::new(config_manager);
    let app = build_app(AppState::new(config_manager.clone()));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    output.banner();
    output.kv("Listening", &format!("http://{}", addr));
    output.kv("Chat UI", &format!("http://{}/", addr));
    output.kv("Webhook", &config.webhook_url());
    output.newline();
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    config_manager.stop_watching();
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(default_filter: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
