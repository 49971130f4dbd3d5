//! Approach endpoints
//!
//! Step board management and analysis. Analysis failures of individual
//! requests are part of the 200 response; only failed preconditions are
//! errors.

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::upload::{collect_files, rejected_files, RejectedFile};
use crate::error::{ApiError, ApiResult, CoachError};
use crate::services::{approach_orchestrator, image_intake, step_analyzer};
use crate::session::{ApproachView, SessionSink, StepView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StepCountRequest {
    pub step_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ActiveStepRequest {
    pub step_index: usize,
}

/// POST /api/approach/bulk response
#[derive(Debug, Serialize)]
pub struct BulkUploadResponse {
    /// Number of steps that received an image
    pub filled: usize,
    pub rejected: Vec<RejectedFile>,
    pub approach: ApproachView,
}

/// POST /api/approach/steps/:index/analyze response
#[derive(Debug, Serialize)]
pub struct StepAnalysisResponse {
    /// False when the step had no image, or its image changed during the request
    pub applied: bool,
    pub step: StepView,
}

/// POST /api/approach/analyze response
#[derive(Debug, Serialize)]
pub struct ApproachAnalysisResponse {
    pub failed_steps: usize,
    pub approach: ApproachView,
}

fn step_view(approach: ApproachView, step_index: usize) -> ApiResult<StepView> {
    approach
        .steps
        .into_iter()
        .nth(step_index)
        .ok_or_else(|| ApiError::NotFound(format!("step {}", step_index)))
}

/// GET /api/approach
pub async fn get_approach(State(state): State<AppState>) -> Json<ApproachView> {
    Json(state.session.read().await.approach_view())
}

/// PUT /api/approach/steps
pub async fn set_step_count(
    State(state): State<AppState>,
    Json(request): Json<StepCountRequest>,
) -> ApiResult<Json<ApproachView>> {
    let mut session = state.session.write().await;
    session.set_step_count(request.step_count)?;
    Ok(Json(session.approach_view()))
}

/// PUT /api/approach/active
pub async fn set_active_step(
    State(state): State<AppState>,
    Json(request): Json<ActiveStepRequest>,
) -> ApiResult<Json<ApproachView>> {
    let mut session = state.session.write().await;
    session.set_active_step(request.step_index)?;
    Ok(Json(session.approach_view()))
}

/// POST /api/approach/steps/:index/image
///
/// Binds the first file of the upload to the step.
pub async fn upload_step_image(
    State(state): State<AppState>,
    Path(step_index): Path<usize>,
    multipart: Multipart,
) -> ApiResult<Json<ApproachView>> {
    let file = collect_files(multipart)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("No files in upload".to_string()))?;
    let frame = image_intake::import_single(file)?;

    let mut session = state.session.write().await;
    session.set_step_image(step_index, Some(frame))?;
    Ok(Json(session.approach_view()))
}

/// DELETE /api/approach/steps/:index/image
pub async fn clear_step_image(
    State(state): State<AppState>,
    Path(step_index): Path<usize>,
) -> ApiResult<Json<ApproachView>> {
    let mut session = state.session.write().await;
    session.set_step_image(step_index, None)?;
    Ok(Json(session.approach_view()))
}

/// POST /api/approach/bulk
///
/// Fills steps `0..` with the valid images of the upload, in order.
pub async fn bulk_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<BulkUploadResponse>> {
    let files = collect_files(multipart).await?;

    let mut session = state.session.write().await;
    let (placed, rejected) = image_intake::bulk_distribute(files, session.board().step_count());
    let filled = session.bulk_place(placed)?;

    Ok(Json(BulkUploadResponse {
        filled,
        rejected: rejected_files(&rejected),
        approach: session.approach_view(),
    }))
}

/// POST /api/approach/steps/:index/analyze
pub async fn analyze_step(
    State(state): State<AppState>,
    Path(step_index): Path<usize>,
) -> ApiResult<Json<StepAnalysisResponse>> {
    let credential = state.store.credential().await?.ok_or(CoachError::MissingCredential)?;

    let (frame, step_count) = {
        let mut session = state.session.write().await;
        (session.begin_step(step_index)?, session.board().step_count())
    };

    let Some(frame) = frame else {
        let session = state.session.read().await;
        return Ok(Json(StepAnalysisResponse {
            applied: false,
            step: step_view(session.approach_view(), step_index)?,
        }));
    };

    let result = step_analyzer::analyze_step(
        state.vision.as_ref(),
        step_index,
        step_count,
        Some(&frame),
        Some(&credential),
    )
    .await;

    let outcome = match result {
        Ok(Some(analysis)) => Ok(analysis),
        Ok(None) => return Err(ApiError::Internal("step analysis returned no result".to_string())),
        Err(CoachError::AnalysisFailed(failure)) => {
            state.record_error(failure.to_string()).await;
            Err(failure)
        }
        Err(other) => return Err(other.into()),
    };

    let mut session = state.session.write().await;
    let applied = session.apply_step_outcome(step_index, frame.id, outcome);
    Ok(Json(StepAnalysisResponse {
        applied,
        step: step_view(session.approach_view(), step_index)?,
    }))
}

/// POST /api/approach/analyze
///
/// Analyzes every step in order, then the approach as a whole. 409 while
/// another run is in flight.
///
/// The run executes on its own task: a client that disconnects only loses the
/// response, the run still completes and its results land in the session.
pub async fn analyze_approach(
    State(state): State<AppState>,
) -> ApiResult<Json<ApproachAnalysisResponse>> {
    let credential = state.store.credential().await?.ok_or(CoachError::MissingCredential)?;
    let scoring_context = state.store.scoring_context().await?;

    let frames = state.session.write().await.begin_approach(&credential)?;

    let run_state = state.clone();
    let run = tokio::spawn(async move {
        let sink = SessionSink::new(run_state.session.clone());
        let result = approach_orchestrator::analyze_all(
            run_state.vision.as_ref(),
            &frames,
            Some(&credential),
            &scoring_context,
            &sink,
        )
        .await;

        run_state.session.write().await.finish_approach();
        if let Ok(report) = &result {
            if let Err(failure) = &report.aggregate {
                run_state.record_error(format!("Aggregate analysis: {}", failure)).await;
            }
        }
        result
    });

    let report = match run.await {
        Ok(result) => result?,
        Err(e) => {
            // A panicked run must not keep the session claimed
            state.session.write().await.finish_approach();
            return Err(ApiError::Internal(format!("Approach analysis task failed: {}", e)));
        }
    };

    let session = state.session.read().await;
    Ok(Json(ApproachAnalysisResponse {
        failed_steps: report.failed_steps(),
        approach: session.approach_view(),
    }))
}

/// Build approach routes
pub fn approach_routes() -> Router<AppState> {
    Router::new()
        .route("/api/approach", get(get_approach))
        .route("/api/approach/steps", put(set_step_count))
        .route("/api/approach/active", put(set_active_step))
        .route(
            "/api/approach/steps/:index/image",
            post(upload_step_image).delete(clear_step_image),
        )
        .route("/api/approach/bulk", post(bulk_upload))
        .route("/api/approach/steps/:index/analyze", post(analyze_step))
        .route("/api/approach/analyze", post(analyze_approach))
}
