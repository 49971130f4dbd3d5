//! Frame preview endpoint

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/frames/:id
///
/// Raw image bytes with their detected media type.
pub async fn get_frame(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Response> {
    let frame = state
        .session
        .read()
        .await
        .frame_by_id(id)
        .ok_or_else(|| ApiError::NotFound(format!("frame {}", id)))?;

    let content_type = HeaderValue::from_str(&frame.media_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=3600")),
        ],
        frame.bytes().to_vec(),
    )
        .into_response())
}

/// Build frame routes
pub fn frame_routes() -> Router<AppState> {
    Router::new().route("/api/frames/:id", get(get_frame))
}
