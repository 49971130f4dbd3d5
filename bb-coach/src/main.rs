//! bb-coach - BowlBetter coaching service
//!
//! Serves the coaching page and its REST + SSE API on localhost. Image
//! analysis is delegated to a vision completion API, or to canned replies
//! in demo mode.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bb_common::config::{
    check_toml_permissions_loose, database_path, default_config_path, load_toml_config,
    resolve_root_folder,
};
use bb_common::events::EventBus;
use clap::Parser;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bb_coach::services::vision_client::{DemoVisionBackend, GroqVisionClient, VisionBackend};
use bb_coach::store::LocalStore;
use bb_coach::AppState;

/// Environment variable overriding the root folder
const ROOT_FOLDER_ENV: &str = "BOWLBETTER_ROOT_FOLDER";

/// Command-line arguments for bb-coach
#[derive(Parser, Debug)]
#[command(name = "bb-coach")]
#[command(about = "BowlBetter bowling coach")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the TOML config)
    #[arg(short, long, env = "BOWLBETTER_PORT")]
    port: Option<u16>,

    /// Root folder holding the database (falls back to BOWLBETTER_ROOT_FOLDER, then TOML)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Bootstrap TOML config file
    #[arg(short, long, env = "BOWLBETTER_CONFIG")]
    config: Option<PathBuf>,

    /// Answer analysis requests with canned replies
    #[arg(long, env = "BOWLBETTER_DEMO")]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(|| default_config_path("bb-coach"));
    let toml_config = load_toml_config(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let level = toml_config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("bb_coach={level},bb_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting bb-coach v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Config: {}", config_path.display());

    if config_path.exists() && matches!(check_toml_permissions_loose(&config_path), Ok(true)) {
        warn!(
            "{} is readable by other users; it may contain the vision API key \
             (chmod 600 recommended)",
            config_path.display()
        );
    }

    let root_folder =
        resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml_config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let db_path = database_path(&root_folder);
    let db_pool = bb_coach::db::init_database_pool(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database: {}", db_path.display());

    let port = args.port.unwrap_or(toml_config.port);
    let demo_mode = args.demo || toml_config.demo_mode;

    let vision: Arc<dyn VisionBackend> = if demo_mode {
        info!("Demo mode: vision requests are answered locally");
        Arc::new(DemoVisionBackend)
    } else {
        let client = GroqVisionClient::new(&toml_config.vision)
            .context("Failed to build vision client")?;
        info!("Vision endpoint: {} ({})", client.endpoint(), toml_config.vision.model);
        Arc::new(client)
    };

    let store = LocalStore::new(db_pool, toml_config, Some(config_path));
    match store.credential_source().await {
        Ok(Some(source)) => info!("Vision API key loaded from {}", source.as_str()),
        Ok(None) => warn!("No vision API key configured; set one on the Settings tab"),
        Err(e) => warn!("Could not resolve vision API key: {}", e),
    }

    let event_bus = EventBus::new(100);
    let state = AppState::new(store, event_bus, vision);
    let app = bb_coach::build_router(state).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("bb-coach shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
