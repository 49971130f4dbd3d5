//! Per-step analysis invoker
//!
//! Stateless: one call in, one result out. Writing the result into the
//! owning step slot is the caller's job.

use crate::error::{AnalysisFailure, CoachError};
use crate::models::{Frame, StepAnalysis};
use crate::services::prompts;
use crate::services::vision_client::{Credential, VisionBackend, VisionRequest, VisionTask};

/// Analyze one approach step
///
/// - No credential: `MissingCredential`, nothing is sent
/// - No frame: `Ok(None)`, nothing is sent
/// - Otherwise exactly one request; failures come back as `AnalysisFailed`
pub async fn analyze_step(
    backend: &dyn VisionBackend,
    step_index: usize,
    step_count: usize,
    frame: Option<&Frame>,
    credential: Option<&Credential>,
) -> Result<Option<StepAnalysis>, CoachError> {
    let credential = credential.ok_or(CoachError::MissingCredential)?;
    let Some(frame) = frame else {
        tracing::debug!(step_index, "No image bound to step, skipping analysis");
        return Ok(None);
    };

    let analysis = invoke_step(backend, credential, step_index, step_count, frame).await?;
    Ok(Some(analysis))
}

/// Send one step request with preconditions already checked
pub(crate) async fn invoke_step(
    backend: &dyn VisionBackend,
    credential: &Credential,
    step_index: usize,
    step_count: usize,
    frame: &Frame,
) -> Result<StepAnalysis, AnalysisFailure> {
    let request = VisionRequest {
        task: VisionTask::Step { index: step_index },
        instruction: prompts::step_instruction(step_index, step_count),
        image_data_url: Some(frame.data_url()),
        max_tokens: None,
    };

    match backend.complete(credential, &request).await {
        Ok(content) => {
            let raw_text = content.into_text();
            tracing::info!(step_index, chars = raw_text.len(), "Step analysis completed");
            Ok(StepAnalysis { step_index, raw_text })
        }
        Err(failure) => {
            tracing::warn!(step_index, kind = failure.kind(), "Step analysis failed: {}", failure);
            Err(failure)
        }
    }
}
