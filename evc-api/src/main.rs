//! evc-api (Event Concierge) - event discovery and recommendation service
//!
//! Startup order: configuration, tracing, preference store, event source,
//! then the HTTP server with graceful shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use evc_api::config::{resolve_bind_address, resolve_composio_settings};
use evc_api::source::{ComposioEventSource, EventSource, MockEventSource};
use evc_api::{build_router, AppState};
use evc_common::config::{load_or_default, RootFolderInitializer, RootFolderResolver, TomlConfig};
use evc_common::db::PreferenceStore;
use evc_common::OnboardingState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "evc-api", version, about = "Event Concierge API server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder holding the preference database
    #[arg(short, long, env = "EVC_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "EVC_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "EVC_PORT")]
    port: Option<u16>,
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_or_default(args.config.as_deref());

    init_tracing(&toml_config)?;

    // Build identification right after tracing init
    info!(
        "Starting Event Concierge (evc-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Preference database: {}", db_path.display());

    let store = Arc::new(PreferenceStore::new(db_path));
    if let Err(e) = store.open().await {
        error!("Failed to open preference store: {}", e);
        return Err(e.into());
    }

    let profile = store.ensure_default_user().await?;
    let onboarding = match store.get_default_user_preferences().await? {
        Some(prefs) => OnboardingState::from_preferences(&prefs),
        None => OnboardingState::new(),
    };
    info!(
        user_id = %profile.id,
        onboarded = profile.is_onboarded,
        "Default user ready"
    );

    let settings = resolve_composio_settings(&toml_config.composio);
    let source: Arc<dyn EventSource> = if settings.is_configured() {
        Arc::new(ComposioEventSource::new(&settings)?)
    } else {
        warn!("COMPOSIO_API_KEY not set, serving the built-in demo catalog");
        Arc::new(MockEventSource::new())
    };
    info!(mode = source.mode().as_str(), "Event source selected");

    let state = AppState::new(source, Arc::clone(&store), onboarding);
    let app = build_router(state);

    let (host, port) = resolve_bind_address(args.host, args.port, &toml_config.server);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("evc-api listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/api/health", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
