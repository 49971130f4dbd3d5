//! UI Routes - single-page coaching interface
//!
//! - **Static Assets** (`static_assets`): CSS/JS file serving
//! - **Root Page** (`root`): the coaching page with sequence, approach,
//!   release, tournament, and equipment panels

use crate::AppState;
use axum::{routing::get, Router};

mod root;
mod static_assets;

use root::root_page;
use static_assets::{serve_coach_css, serve_coach_js};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/static/coach.css", get(serve_coach_css))
        .route("/static/coach.js", get(serve_coach_js))
}
