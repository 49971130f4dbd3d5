//! Ball release endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::{ApiResult, CoachError};
use crate::services::release_analyzer;
use crate::session::ReleaseView;
use crate::AppState;

/// GET /api/release
pub async fn get_release(State(state): State<AppState>) -> Json<ReleaseView> {
    Json(state.session.read().await.release_view())
}

/// POST /api/release/analyze
///
/// Analyzes the frame assigned the release role. Without one this is a no-op
/// returning the current view.
pub async fn analyze_release(State(state): State<AppState>) -> ApiResult<Json<ReleaseView>> {
    let credential = state.store.credential().await?.ok_or(CoachError::MissingCredential)?;

    let frame = state.session.write().await.begin_release();
    let Some(frame) = frame else {
        return Ok(Json(state.session.read().await.release_view()));
    };

    let result = release_analyzer::analyze_release(
        state.vision.as_ref(),
        Some(&frame),
        Some(&credential),
    )
    .await;

    let mut session = state.session.write().await;
    match result {
        Ok(Some(analysis)) => {
            session.apply_release_outcome(frame.id, Ok(analysis));
        }
        Ok(None) => session.abort_release(frame.id),
        Err(CoachError::AnalysisFailed(failure)) => {
            state.record_error(format!("Release analysis: {}", failure)).await;
            session.apply_release_outcome(frame.id, Err(failure));
        }
        Err(other) => {
            session.abort_release(frame.id);
            return Err(other.into());
        }
    }

    Ok(Json(session.release_view()))
}

/// Build release routes
pub fn release_routes() -> Router<AppState> {
    Router::new()
        .route("/api/release", get(get_release))
        .route("/api/release/analyze", post(analyze_release))
}
