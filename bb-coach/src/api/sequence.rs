//! Image sequence endpoints
//!
//! Batch import, scrubbing, and explicit frame-to-role assignment.

use axum::{
    extract::{Multipart, State},
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::upload::{collect_files, rejected_files, RejectedFile};
use crate::error::{ApiError, ApiResult};
use crate::models::Role;
use crate::services::image_intake;
use crate::session::{ApproachView, SequenceView};
use crate::AppState;

/// POST /api/sequence response
#[derive(Debug, Serialize)]
pub struct ImportSequenceResponse {
    pub sequence: SequenceView,
    pub rejected: Vec<RejectedFile>,
}

#[derive(Debug, Deserialize)]
pub struct CursorRequest {
    pub frame_index: usize,
}

#[derive(Debug, Serialize)]
pub struct CursorResponse {
    pub current_frame_index: usize,
}

/// POST /api/sequence/assign request
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub role: Role,
    /// Defaults to the scrubbed frame
    #[serde(default)]
    pub frame_index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AssignResponse {
    /// Assigned frame index; null when there was no sequence to assign from
    pub frame_index: Option<usize>,
    pub sequence: SequenceView,
    pub approach: ApproachView,
}

/// POST /api/sequence
///
/// Replaces the sequence with the valid images of the upload. Invalid files
/// are listed in `rejected`. An upload with no valid image leaves the current
/// sequence untouched and fails with 400.
pub async fn import_sequence(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ImportSequenceResponse>> {
    let files = collect_files(multipart).await?;
    let mut report = image_intake::import_batch(files);

    if report.frames.is_empty() {
        let first = report.rejected.drain(..).next();
        return Err(first
            .map(ApiError::from)
            .unwrap_or_else(|| ApiError::BadRequest("No images in upload".to_string())));
    }

    let mut session = state.session.write().await;
    session.import_sequence(&report);

    Ok(Json(ImportSequenceResponse {
        sequence: session.sequence_view(),
        rejected: rejected_files(&report.rejected),
    }))
}

/// GET /api/sequence
pub async fn get_sequence(State(state): State<AppState>) -> Json<SequenceView> {
    Json(state.session.read().await.sequence_view())
}

/// PUT /api/sequence/cursor
pub async fn set_cursor(
    State(state): State<AppState>,
    Json(request): Json<CursorRequest>,
) -> Json<CursorResponse> {
    let current_frame_index = state.session.write().await.set_cursor(request.frame_index);
    Json(CursorResponse { current_frame_index })
}

/// POST /api/sequence/assign
pub async fn assign_frame(
    State(state): State<AppState>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<AssignResponse>> {
    let mut session = state.session.write().await;
    let frame_index = session.assign_frame(request.frame_index, request.role)?;

    Ok(Json(AssignResponse {
        frame_index,
        sequence: session.sequence_view(),
        approach: session.approach_view(),
    }))
}

/// Build sequence routes
pub fn sequence_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sequence", post(import_sequence).get(get_sequence))
        .route("/api/sequence/cursor", put(set_cursor))
        .route("/api/sequence/assign", post(assign_frame))
}
