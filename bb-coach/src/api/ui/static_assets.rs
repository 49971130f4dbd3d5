//! Static asset handlers
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const COACH_CSS: &str = include_str!("../../../static/coach.css");
const COACH_JS: &str = include_str!("../../../static/coach.js");

/// GET /static/coach.css
pub async fn serve_coach_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        COACH_CSS,
    )
        .into_response()
}

/// GET /static/coach.js
///
/// Page logic: REST calls plus the `/events` subscription
pub async fn serve_coach_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        COACH_JS,
    )
        .into_response()
}
