//! Focus Filter - notification triage service
//!
//! Classifies notifications by urgency, remembers durable facts from them,
//! and decides whether each one is displayed, blocked or saved for later.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use focus_filter::{
    agents::{Credentials, Orchestrator},
    api::build_app,
    config::FocusFilterConfig,
    memory::MemoryStore,
    notification::Notification,
    notifications::{ApiKeyAuth, NotificationStore, NotificationsState},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "focus-filter")]
#[command(author = "Focus Filter Team")]
#[command(version)]
#[command(about = "Notification triage pipeline with fact memory")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FOCUS_FILTER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Use keyword rules instead of the external model
        #[arg(long)]
        offline: bool,

        /// Directory for persisted notifications and results
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Run one notification through the full pipeline
    Process {
        #[command(flatten)]
        notification: NotificationArgs,

        /// Use keyword rules instead of the external model
        #[arg(long)]
        offline: bool,
    },

    /// Classify one notification without extracting facts
    Classify {
        #[command(flatten)]
        notification: NotificationArgs,

        /// Use keyword rules instead of the external model
        #[arg(long)]
        offline: bool,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(clap::Args)]
struct NotificationArgs {
    /// Notification title
    #[arg(short, long)]
    title: String,

    /// Notification body
    #[arg(short, long, default_value = "")]
    body: String,

    /// Source app name
    #[arg(short, long)]
    app: String,

    /// Android package name
    #[arg(short, long)]
    package: Option<String>,
}

impl NotificationArgs {
    fn build(self) -> Result<Notification> {
        let mut builder = Notification::builder(self.title, self.body, self.app);
        if let Some(package) = self.package {
            builder = builder.package_name(package);
        }
        Ok(builder.build()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => FocusFilterConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FocusFilterConfig::default(),
    };

    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Serve {
            host,
            port,
            offline,
            data_dir,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.storage.data_dir = data_dir;
            }
            config.model.offline |= offline;
            run_server(config).await?;
        }
        Commands::Process {
            notification,
            offline,
        } => {
            let notification = notification.build()?;
            let pipeline = build_pipeline(&config, offline)?;
            let mut memory = MemoryStore::new();
            let result = pipeline.run(&notification, &mut memory).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Classify {
            notification,
            offline,
        } => {
            let notification = notification.build()?;
            let pipeline = build_pipeline(&config, offline)?;
            let result = pipeline.classify(&notification, &MemoryStore::new()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn init_logging(config: &FocusFilterConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("focus_filter={},tower_http={}", level, level).into());

    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Pick offline or model-backed stages; a missing credential forces offline
fn build_pipeline(config: &FocusFilterConfig, offline: bool) -> Result<Orchestrator> {
    let credentials = Credentials::from_env(&config.model.api_key_env);
    let mut offline = offline || config.model.offline;

    if !offline && credentials.is_none() {
        tracing::warn!(
            "{} is not set, using offline keyword classification",
            config.model.api_key_env
        );
        offline = true;
    }

    let pipeline = Orchestrator::from_credentials(credentials.as_ref(), offline, &config.model)?;
    tracing::info!(
        classifier = pipeline.classifier_name(),
        extractor = pipeline.extractor_name(),
        "Pipeline ready"
    );
    Ok(pipeline)
}

async fn run_server(config: FocusFilterConfig) -> Result<()> {
    tracing::info!("Starting Focus Filter");

    let store = NotificationStore::new(config.storage.data_dir.clone())
        .await
        .with_context(|| format!("Failed to open data dir {}", config.storage.data_dir.display()))?;
    let pipeline = build_pipeline(&config, config.model.offline)?;
    let auth = ApiKeyAuth::from_env(&config.auth.api_key_env);

    let state = NotificationsState::new(
        Arc::new(store),
        Arc::new(pipeline),
        config.memory.mode,
        auth,
    );
    let app = build_app(state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        memory_mode = ?config.memory.mode,
        data_dir = %config.storage.data_dir.display(),
        "Focus Filter listening on {}. Press Ctrl+C to stop.",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}

fn show_config(config: Option<&FocusFilterConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
