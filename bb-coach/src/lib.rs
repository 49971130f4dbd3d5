//! bb-coach library interface
//!
//! Exposes the coaching service for the binary and for integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod store;

pub use crate::error::{ApiError, ApiResult, CoachError, CoachResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use bb_common::events::EventBus;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::vision_client::VisionBackend;
use crate::session::CoachSession;
use crate::store::LocalStore;

/// Largest accepted request body (image batches)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Persisted settings and collections
    pub store: LocalStore,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// The coaching session
    pub session: Arc<RwLock<CoachSession>>,
    /// Vision completion backend (HTTP or demo)
    pub vision: Arc<dyn VisionBackend>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(store: LocalStore, event_bus: EventBus, vision: Arc<dyn VisionBackend>) -> Self {
        Self {
            db: store.db().clone(),
            session: Arc::new(RwLock::new(CoachSession::new(event_bus.clone()))),
            store,
            event_bus,
            vision,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember an error for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .merge(api::settings_routes())
        .merge(api::sequence_routes())
        .merge(api::approach_routes())
        .merge(api::release_routes())
        .merge(api::ask_routes())
        .merge(api::tournament_routes())
        .merge(api::inventory_routes())
        .merge(api::frame_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
}
