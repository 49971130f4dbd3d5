//! Free-form question endpoint

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};

use super::upload::collect_form;
use crate::error::{ApiResult, CoachError};
use crate::services::coach_questions::{self, CoachAnswer};
use crate::services::image_intake;
use crate::AppState;

/// POST /api/ask
///
/// Multipart form: `question`, optional `context`, optional image file.
/// A non-image file is rejected before anything is sent.
pub async fn ask_question(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<CoachAnswer>> {
    let mut form = collect_form(multipart).await?;
    let image = std::mem::take(&mut form.files)
        .into_iter()
        .next()
        .map(image_intake::import_single)
        .transpose()?;

    let credential = state.store.credential().await?;
    let result = coach_questions::ask(
        state.vision.as_ref(),
        credential.as_ref(),
        form.text("question"),
        form.text("context"),
        image.as_ref(),
    )
    .await;

    if let Err(CoachError::AnalysisFailed(failure)) = &result {
        state.record_error(format!("Question: {}", failure)).await;
    }
    Ok(Json(result?))
}

/// Build question routes
pub fn ask_routes() -> Router<AppState> {
    Router::new().route("/api/ask", post(ask_question))
}
